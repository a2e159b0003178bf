use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::access::Access;
use crate::guard::RwGuard;
use crate::Str;

use super::{BorrowError, Lock, LockRef};

/// Reader-preferring reader-writer lock.
///
/// The first reader in closes the global gate on behalf of all readers and
/// the last reader out opens it again; writers take the gate directly. A
/// steady stream of readers can therefore starve writers indefinitely.
pub struct RwLock {
    readers: Mutex<usize>,
    global: Gate,
}

/// Binary semaphore. Unlike a mutex guard it can be opened by a thread other
/// than the one that closed it, which the last-reader-out path needs.
struct Gate {
    closed: Mutex<bool>,
    opened: Condvar,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Gate {
    fn close(&self) {
        let mut closed = lock(&self.closed);
        while *closed {
            closed = self.opened.wait(closed)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *closed = true;
    }
    fn open(&self) {
        *lock(&self.closed) = false;
        self.opened.notify_one();
    }
}

impl RwLock {
    pub fn new() -> Self {
        RwLock {
            readers: Mutex::new(0),
            global: Gate { closed: Mutex::new(false), opened: Condvar::new() },
        }
    }

    /// Number of readers currently inside.
    pub fn readers(&self) -> usize { *lock(&self.readers) }

    pub(crate) fn lock_read(&self) {
        let mut readers = lock(&self.readers);
        *readers += 1;
        if *readers == 1 { self.global.close(); }
    }
    pub(crate) fn unlock_read(&self) {
        let mut readers = lock(&self.readers);
        *readers -= 1;
        if *readers == 0 { self.global.open(); }
    }
    pub(crate) fn lock_write(&self) { self.global.close(); }
    pub(crate) fn unlock_write(&self) { self.global.open(); }
}

impl Default for RwLock {
    fn default() -> Self { Self::new() }
}

impl Lock for RwLock {
    const NAME: Str = "RW Lock";
    const CODE: Str = "RW";
    type Ref<'a> = &'a RwLock;
    fn borrow(&self) -> Result<Self::Ref<'_>, BorrowError> {
        Ok(self)
    }
}

impl<'a> LockRef<'a> for &'a RwLock {
    type Guard<'g> = RwGuard<'g> where Self: 'g;
    fn acquire<'g>(&'g mut self, access: Access) -> Self::Guard<'g> {
        let lock = *self;
        match access {
            Access::Read => lock.lock_read(),
            Access::Write => lock.lock_write(),
        }
        RwGuard::new(lock, access)
    }
}
