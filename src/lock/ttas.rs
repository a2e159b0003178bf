use std::sync::atomic::{AtomicBool, Ordering::*};

use crate::access::Access;
use crate::guard::TasGuard;
use crate::spin::{SpinPolicy, Spinner};
use crate::Str;

use super::{BorrowError, Lock, LockRef};

/// Test-and-test-and-set: waiters spin on a shared read of the flag and only
/// attempt the exchange once it looks free, so the line stays shared while
/// the lock is held.
pub struct TtasLock {
    locked: AtomicBool,
    policy: SpinPolicy,
}

impl TtasLock {
    pub fn new(policy: SpinPolicy) -> Self {
        TtasLock { locked: AtomicBool::new(false), policy }
    }

    fn try_acquire(&self, spinner: &mut Spinner) -> bool {
        while self.locked.load(Acquire) { spinner.spin(); }
        !self.locked.swap(true, Acquire)
    }
}

impl Lock for TtasLock {
    const NAME: Str = "Spin Lock (test and test and set)";
    const CODE: Str = "TTS";
    type Ref<'a> = &'a TtasLock;
    fn borrow(&self) -> Result<Self::Ref<'_>, BorrowError> {
        Ok(self)
    }
}

impl<'a> LockRef<'a> for &'a TtasLock {
    type Guard<'g> = TasGuard<'g> where Self: 'g;
    fn acquire<'g>(&'g mut self, _: Access) -> Self::Guard<'g> {
        let lock = *self;
        let mut spinner = lock.policy.spinner();
        while !lock.try_acquire(&mut spinner) { };
        TasGuard::new(&lock.locked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::testing::hammer;

    #[test]
    fn try_acquire_fails_only_on_a_lost_race() {
        let lock = TtasLock::new(SpinPolicy::Spin);
        let mut spinner = SpinPolicy::Spin.spinner();
        assert!(lock.try_acquire(&mut spinner));
        lock.locked.store(false, Release);
        assert!(lock.try_acquire(&mut spinner));
    }

    #[test]
    fn excludes_under_contention() {
        assert_eq!(hammer(&TtasLock::new(SpinPolicy::Yield), 8, 200), 1600);
    }
}
