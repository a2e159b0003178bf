#![deny(unsafe_op_in_unsafe_fn)]

//! Mutual-exclusion algorithms under contention, and a multi-threaded
//! harness that checks them for lost updates while timing every acquire.

pub mod access;
pub mod barrier;
pub mod config;
pub mod error;
pub mod harness;
pub mod lock;
pub mod pad;
pub mod report;
pub mod spin;
pub mod stats;
pub mod workload;

mod guard;

pub use access::Access;
pub use config::BenchConfig;
pub use error::{BenchError, Result};
pub use guard::{ArrayGuard, RwGuard, TasGuard, TicketGuard};
pub use harness::Harness;
pub use lock::{Lock, LockKind, LockRef, Variant};
pub use report::{RunReport, ThreadSamples, VariantReport};
pub use spin::SpinPolicy;
pub use workload::{Mix, Schedule, Work};

type Str = &'static str;
