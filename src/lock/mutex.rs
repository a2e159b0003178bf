use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::access::Access;
use crate::Str;

use super::{BorrowError, Lock, LockRef};

/// Baseline: the OS-backed standard mutex. Waiters are parked by the
/// scheduler instead of spinning.
pub struct MutexLock { inner: Mutex<()> }

impl MutexLock {
    pub fn new() -> Self {
        MutexLock { inner: Mutex::new(()) }
    }
}

impl Default for MutexLock {
    fn default() -> Self { Self::new() }
}

impl Lock for MutexLock {
    const NAME: Str = "Naive Lock (mutex)";
    const CODE: Str = "MUTEX";
    type Ref<'a> = &'a MutexLock;
    fn borrow(&self) -> Result<Self::Ref<'_>, BorrowError> {
        Ok(self)
    }
}

impl<'a> LockRef<'a> for &'a MutexLock {
    type Guard<'g> = MutexGuard<'g, ()> where Self: 'g;
    fn acquire<'g>(&'g mut self, _: Access) -> Self::Guard<'g> {
        let lock = *self;
        lock.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::testing::hammer;

    #[test]
    fn excludes_under_contention() {
        assert_eq!(hammer(&MutexLock::new(), 8, 200), 1600);
    }

    #[test]
    fn reads_are_exclusive_too() {
        let lock = MutexLock::new();
        let mut handle = lock.borrow().unwrap();
        let _guard = handle.acquire(Access::Read);
        assert!(lock.inner.try_lock().is_err());
    }
}
