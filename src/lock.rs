use failure::Fail;
use std::fmt;
use std::str::FromStr;

use crate::access::Access;
use crate::error::BenchError;
use crate::spin::SpinPolicy;
use crate::Str;

mod array;
mod mutex;
mod rw;
mod tas;
mod ticket;
mod ttas;

pub use array::{ArrayLock, ArrayRef};
pub use mutex::MutexLock;
pub use rw::RwLock;
pub use tas::TasLock;
pub use ticket::TicketLock;
pub use ttas::TtasLock;

pub trait Lock: Sync {
    /// Human readable name, printed in reports.
    const NAME: Str;
    /// Short code, used on the command line and in output file names.
    const CODE: Str;
    type Ref<'a>: LockRef<'a> where Self: 'a;
    fn borrow(&self) -> Result<Self::Ref<'_>, BorrowError>;
}

pub trait LockRef<'a>: Send {
    // the guard's drop method should release the lock; it borrows the
    // handle, so the handle outlives every guard it hands out
    type Guard<'g> where Self: 'g;
    fn acquire<'g>(&'g mut self, access: Access) -> Self::Guard<'g>;
}

#[derive(Fail, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowError {
    #[fail(display = "thread capacity exceeded")]
    ThreadCapacityExceeded,
}

/// Selects one of the lock algorithms without building it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockKind {
    Mutex,
    Tas,
    Ttas,
    Rw,
    Ticket,
    Array,
}

impl LockKind {
    pub const ALL: [LockKind; 6] = [
        LockKind::Mutex,
        LockKind::Tas,
        LockKind::Ttas,
        LockKind::Rw,
        LockKind::Ticket,
        LockKind::Array,
    ];

    pub fn code(self) -> Str {
        match self {
            LockKind::Mutex => MutexLock::CODE,
            LockKind::Tas => TasLock::CODE,
            LockKind::Ttas => TtasLock::CODE,
            LockKind::Rw => RwLock::CODE,
            LockKind::Ticket => TicketLock::CODE,
            LockKind::Array => ArrayLock::CODE,
        }
    }

    /// `threads` sizes the array lock; the other variants ignore it.
    pub fn build(self, threads: usize, policy: SpinPolicy) -> Variant {
        match self {
            LockKind::Mutex => Variant::Mutex(MutexLock::new()),
            LockKind::Tas => Variant::Tas(TasLock::new(policy)),
            LockKind::Ttas => Variant::Ttas(TtasLock::new(policy)),
            LockKind::Rw => Variant::Rw(RwLock::new()),
            LockKind::Ticket => Variant::Ticket(TicketLock::new(policy)),
            LockKind::Array => {
                Variant::Array(ArrayLock::with_capacity(threads, policy))
            }
        }
    }
}

impl FromStr for LockKind {
    type Err = BenchError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LockKind::ALL.iter()
            .copied()
            .find(|kind| kind.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BenchError::UnknownLock(s.to_owned()))
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The closed set of benchmarked locks.
///
/// Callers match once (see [`dispatch!`]) and then run fully monomorphised
/// code, so no indirect call ends up inside a timed region.
pub enum Variant {
    Mutex(MutexLock),
    Tas(TasLock),
    Ttas(TtasLock),
    Rw(RwLock),
    Ticket(TicketLock),
    Array(ArrayLock),
}

/// Binds the concrete lock inside a [`Variant`] and evaluates `$body` with
/// it, once per variant type.
macro_rules! dispatch {
    ($variant:expr, $lock:ident => $body:expr) => {
        match $variant {
            $crate::lock::Variant::Mutex($lock) => $body,
            $crate::lock::Variant::Tas($lock) => $body,
            $crate::lock::Variant::Ttas($lock) => $body,
            $crate::lock::Variant::Rw($lock) => $body,
            $crate::lock::Variant::Ticket($lock) => $body,
            $crate::lock::Variant::Array($lock) => $body,
        }
    };
}
pub(crate) use dispatch;

impl Variant {
    pub fn kind(&self) -> LockKind {
        match self {
            Variant::Mutex(_) => LockKind::Mutex,
            Variant::Tas(_) => LockKind::Tas,
            Variant::Ttas(_) => LockKind::Ttas,
            Variant::Rw(_) => LockKind::Rw,
            Variant::Ticket(_) => LockKind::Ticket,
            Variant::Array(_) => LockKind::Array,
        }
    }
    pub fn name(&self) -> Str {
        fn name_of<L: Lock>(_: &L) -> Str { L::NAME }
        dispatch!(self, lock => name_of(lock))
    }
    pub fn code(&self) -> Str { self.kind().code() }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Variant").field(&self.code()).finish()
    }
}
