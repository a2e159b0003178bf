use std::sync::atomic::{AtomicUsize, Ordering::*};

use crate::access::Access;
use crate::guard::TicketGuard;
use crate::pad::CachePadded;
use crate::spin::SpinPolicy;
use crate::Str;

use super::{BorrowError, Lock, LockRef};

/// FIFO spin lock. Arrivals draw from `next_ticket`; waiters read only
/// `now_serving`, which lives on a different line.
pub struct TicketLock {
    now_serving: CachePadded<AtomicUsize>,
    next_ticket: CachePadded<AtomicUsize>,
    policy: SpinPolicy,
}

impl TicketLock {
    pub fn new(policy: SpinPolicy) -> Self {
        TicketLock {
            now_serving: CachePadded::new(AtomicUsize::new(0)),
            next_ticket: CachePadded::new(AtomicUsize::new(0)),
            policy,
        }
    }
}

impl Lock for TicketLock {
    const NAME: Str = "Ticket Lock";
    const CODE: Str = "TICKET";
    type Ref<'a> = &'a TicketLock;
    fn borrow(&self) -> Result<Self::Ref<'_>, BorrowError> {
        Ok(self)
    }
}

impl<'a> LockRef<'a> for &'a TicketLock {
    type Guard<'g> = TicketGuard<'g> where Self: 'g;
    fn acquire<'g>(&'g mut self, _: Access) -> Self::Guard<'g> {
        let lock = *self;
        // issuing only has to be totally ordered, visibility comes from
        // the acquire load below
        let ticket = lock.next_ticket.fetch_add(1, Relaxed);
        let mut spinner = lock.policy.spinner();
        while lock.now_serving.load(Acquire) != ticket { spinner.spin(); }
        TicketGuard::new(&lock.now_serving, ticket)
    }
}
