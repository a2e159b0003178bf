use std::sync::atomic::{AtomicBool, Ordering::*};

use crate::access::Access;
use crate::guard::TasGuard;
use crate::spin::SpinPolicy;
use crate::Str;

use super::{BorrowError, Lock, LockRef};

pub struct TasLock {
    locked: AtomicBool,
    policy: SpinPolicy,
}

impl TasLock {
    pub fn new(policy: SpinPolicy) -> Self {
        TasLock { locked: AtomicBool::new(false), policy }
    }
}

impl Lock for TasLock {
    const NAME: Str = "Spin Lock (test and set)";
    const CODE: Str = "TS";
    type Ref<'a> = &'a TasLock;
    fn borrow(&self) -> Result<Self::Ref<'_>, BorrowError> {
        Ok(self)
    }
}

impl<'a> LockRef<'a> for &'a TasLock {
    type Guard<'g> = TasGuard<'g> where Self: 'g;
    fn acquire<'g>(&'g mut self, _: Access) -> Self::Guard<'g> {
        let lock = *self;
        let mut spinner = lock.policy.spinner();
        while lock.locked.swap(true, Acquire) { spinner.spin(); }
        TasGuard::new(&lock.locked)
    }
}
