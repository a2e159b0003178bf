use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering::*};

use crate::access::Access;
use crate::lock::RwLock;

pub struct TasGuard<'a> { locked: &'a AtomicBool }

impl<'a> TasGuard<'a> {
    pub fn new(locked: &'a AtomicBool) -> Self {
        Self { locked }
    }
}

impl Drop for TasGuard<'_> {
    fn drop(&mut self) {
        self.locked.store(false, Release);
    }
}

pub struct TicketGuard<'a> {
    now_serving: &'a AtomicUsize,
    ticket: usize,
}

impl<'a> TicketGuard<'a> {
    pub fn new(now_serving: &'a AtomicUsize, ticket: usize) -> Self {
        Self { now_serving, ticket }
    }
    /// Position of this acquisition in arrival order.
    pub fn ticket(&self) -> usize { self.ticket }
}

impl Drop for TicketGuard<'_> {
    fn drop(&mut self) {
        self.now_serving.fetch_add(1, Release);
    }
}

pub struct ArrayGuard<'a> {
    curr_flag: &'a AtomicBool,
    next_flag: &'a AtomicBool,
    slot: usize,
}

impl<'a> ArrayGuard<'a> {
    pub fn new(curr_flag: &'a AtomicBool, next_flag: &'a AtomicBool, slot: usize) -> Self {
        Self { curr_flag, next_flag, slot }
    }
    pub fn slot(&self) -> usize { self.slot }
}

impl Drop for ArrayGuard<'_> {
    fn drop(&mut self) {
        self.curr_flag.store(false, Relaxed);
        self.next_flag.store(true, Release);
    }
}

pub struct RwGuard<'a> {
    lock: &'a RwLock,
    access: Access,
}

impl<'a> RwGuard<'a> {
    pub fn new(lock: &'a RwLock, access: Access) -> Self {
        Self { lock, access }
    }
}

impl Drop for RwGuard<'_> {
    fn drop(&mut self) {
        match self.access {
            Access::Read => self.lock.unlock_read(),
            Access::Write => self.lock.unlock_write(),
        }
    }
}
