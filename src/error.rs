use failure::Fail;
use std::io;

use crate::lock::BorrowError;
use crate::Str;

/// Error type for lockbench.
#[derive(Fail, Debug)]
pub enum BenchError {
    /// A run needs at least one worker thread.
    #[fail(display = "thread count must be at least 1")]
    NoThreads,
    /// A run needs at least one operation per thread.
    #[fail(display = "iteration count must be at least 1")]
    NoIterations,
    /// Write fraction outside `[0, 1]`, or NaN.
    #[fail(display = "write fraction {} is outside [0, 1]", _0)]
    WriteFraction(f64),
    /// Nothing to benchmark.
    #[fail(display = "no lock variants selected")]
    NoLocks,
    /// Backoff bounds must satisfy `0 < min <= max`.
    #[fail(display = "backoff bounds must satisfy 0 < min <= max")]
    Backoff,
    #[fail(display = "unknown lock code: {}", _0)]
    UnknownLock(String),
    #[fail(display = "unknown spin policy: {}", _0)]
    UnknownPolicy(String),
    #[fail(display = "unknown workload mix: {}", _0)]
    UnknownMix(String),
    /// A worker could not get a handle on a lock.
    #[fail(display = "{}", _0)]
    Borrow(#[cause] BorrowError),
    /// The shared counter disagrees with the number of write operations:
    /// the lock let two writers in at once.
    #[fail(display = "{} is incorrect! expected {} got {}", lock, expected, actual)]
    Violation { lock: Str, expected: u64, actual: u64 },
    /// The run was torn down by another thread's failure.
    #[fail(display = "benchmark aborted")]
    Aborted,
    #[fail(display = "worker thread panicked")]
    WorkerPanicked,
    /// IO error.
    #[fail(display = "{}", _0)]
    Io(#[cause] io::Error),
}

impl From<io::Error> for BenchError {
    fn from(err: io::Error) -> BenchError {
        BenchError::Io(err)
    }
}

impl From<BorrowError> for BenchError {
    fn from(err: BorrowError) -> BenchError {
        BenchError::Borrow(err)
    }
}

/// Result type for lockbench.
pub type Result<T> = std::result::Result<T, BenchError>;
