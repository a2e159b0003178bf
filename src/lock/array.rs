use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicUsize, Ordering::*};

use crate::access::Access;
use crate::guard::ArrayGuard;
use crate::pad::CachePadded;
use crate::spin::SpinPolicy;
use crate::Str;

use super::{BorrowError::{self, *}, Lock, LockRef};

/// Anderson's array-based queue lock.
///
/// Each waiter spins on a private, cache-padded slot; the holder hands the
/// lock over by flipping the next slot. Supports at most `capacity`
/// concurrent handles, which [`Lock::borrow`] enforces.
///
/// A guard borrows the handle it came from, so a handle's slot cannot be
/// given back while the handle still holds the lock:
///
/// ```
/// use lockbench::lock::ArrayLock;
/// use lockbench::{Access, Lock, LockRef, SpinPolicy};
///
/// let lock = ArrayLock::with_capacity(2, SpinPolicy::Spin);
/// let mut handle = lock.borrow().unwrap();
/// let guard = handle.acquire(Access::Write);
/// drop(guard);
/// drop(handle);
/// assert_eq!(lock.refs_left(), 2);
/// ```
///
/// ```compile_fail
/// use lockbench::lock::ArrayLock;
/// use lockbench::{Access, Lock, LockRef, SpinPolicy};
///
/// let lock = ArrayLock::with_capacity(2, SpinPolicy::Spin);
/// let mut handle = lock.borrow().unwrap();
/// let guard = handle.acquire(Access::Write);
/// drop(handle);
/// drop(guard);
/// ```
pub struct ArrayLock {
    flags: Box<[CachePadded<AtomicBool>]>,
    next_slot: CachePadded<AtomicUsize>,
    refs_left: AtomicIsize,
    policy: SpinPolicy,
}

pub struct ArrayRef<'a>(&'a ArrayLock);

impl ArrayLock {
    pub fn with_capacity(max_threads: usize, policy: SpinPolicy) -> Self {
        if max_threads == 0 {
            panic!("array lock needs at least one slot")
        }
        let mut flags = Vec::with_capacity(max_threads);
        flags.push(CachePadded::new(AtomicBool::new(true)));
        for _ in 1..max_threads {
            flags.push(CachePadded::new(AtomicBool::new(false)));
        }
        ArrayLock {
            flags: flags.into_boxed_slice(),
            next_slot: CachePadded::new(AtomicUsize::new(0)),
            refs_left: AtomicIsize::new(max_threads as isize),
            policy,
        }
    }
    pub fn capacity(&self) -> usize { self.flags.len() }
    pub fn refs_left(&self) -> usize {
        let refs_left = self.refs_left.load(Relaxed);
        if refs_left < 0 { 0 } else { refs_left as usize }
    }
    fn get_flag(&self, slot: usize) -> &AtomicBool {
        // index is always in bounds because of the modulo
        unsafe { &**self.flags.get_unchecked(slot % self.capacity()) }
    }
}

impl Lock for ArrayLock {
    const NAME: Str = "Array Lock";
    const CODE: Str = "ARRAY";
    type Ref<'a> = ArrayRef<'a>;
    fn borrow(&self) -> Result<Self::Ref<'_>, BorrowError> {
        let refs_left = self.refs_left.fetch_sub(1, Relaxed);
        if refs_left > 0 {
            Ok(ArrayRef(self))
        } else {
            self.refs_left.fetch_add(1, Relaxed);
            Err(ThreadCapacityExceeded)
        }
    }
}

impl Drop for ArrayRef<'_> {
    fn drop(&mut self) {
        self.0.refs_left.fetch_add(1, Relaxed);
    }
}

impl<'a> LockRef<'a> for ArrayRef<'a> {
    type Guard<'g> = ArrayGuard<'g> where Self: 'g;
    fn acquire<'g>(&'g mut self, _: Access) -> Self::Guard<'g> {
        let lock = self.0;
        let capacity = lock.capacity();
        let slot = lock.next_slot
            .fetch_update(Relaxed, Relaxed, |slot| Some((slot + 1) % capacity))
            .unwrap_or_else(|slot| slot);
        let curr_flag = lock.get_flag(slot);
        let next_flag = lock.get_flag(slot + 1);
        let mut spinner = lock.policy.spinner();
        while !curr_flag.load(Acquire) { spinner.spin(); }
        ArrayGuard::new(curr_flag, next_flag, slot)
    }
}
