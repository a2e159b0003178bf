use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::{BenchError, Result};

/// Two-stage rendezvous between the driver and a fixed set of workers.
///
/// Per phase: every worker calls [`ready`](Self::ready) and blocks; the
/// driver observes all of them with [`wait_ready`](Self::wait_ready), then
/// [`release`](Self::release)s the phase; workers run and call
/// [`finish`](Self::finish); the driver collects them with
/// [`wait_finished`](Self::wait_finished). Both counts reset every phase.
/// Waits have no timeout; [`abort`](Self::abort) is the only way out.
pub struct PhaseBarrier {
    threads: usize,
    state: Mutex<State>,
    // workers wait here for the next release
    go: Condvar,
    // the driver waits here for ready / finished counts
    progress: Condvar,
}

#[derive(Default)]
struct State {
    ready: usize,
    finished: usize,
    /// Number of phases released so far.
    released: usize,
    aborted: bool,
}

impl PhaseBarrier {
    pub fn new(threads: usize) -> Self {
        PhaseBarrier {
            threads,
            state: Mutex::new(State::default()),
            go: Condvar::new(),
            progress: Condvar::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(cv: &Condvar, state: MutexGuard<'a, State>) -> MutexGuard<'a, State> {
        cv.wait(state).unwrap_or_else(PoisonError::into_inner)
    }

    /// Worker side: registers as ready for `phase` (0-based) and blocks
    /// until the driver releases it.
    pub fn ready(&self, phase: usize) -> Result<()> {
        let mut state = self.state();
        state.ready += 1;
        if state.ready == self.threads { self.progress.notify_all(); }
        while state.released <= phase && !state.aborted {
            state = Self::wait(&self.go, state);
        }
        if state.aborted { Err(BenchError::Aborted) } else { Ok(()) }
    }

    /// Worker side: done with the current phase.
    pub fn finish(&self) {
        let mut state = self.state();
        state.finished += 1;
        if state.finished == self.threads { self.progress.notify_all(); }
    }

    /// Driver side: blocks until every worker is ready, then resets the count.
    pub fn wait_ready(&self) -> Result<()> {
        let mut state = self.state();
        while state.ready < self.threads && !state.aborted {
            state = Self::wait(&self.progress, state);
        }
        if state.aborted { return Err(BenchError::Aborted) }
        state.ready = 0;
        Ok(())
    }

    /// Driver side: lets the waiting workers start the next phase.
    pub fn release(&self) {
        self.state().released += 1;
        self.go.notify_all();
    }

    /// Driver side: blocks until every worker finished, then resets the count.
    pub fn wait_finished(&self) -> Result<()> {
        let mut state = self.state();
        while state.finished < self.threads && !state.aborted {
            state = Self::wait(&self.progress, state);
        }
        if state.aborted { return Err(BenchError::Aborted) }
        state.finished = 0;
        Ok(())
    }

    /// Wakes everybody; every wait from now on fails with `Aborted`.
    pub fn abort(&self) {
        self.state().aborted = true;
        self.go.notify_all();
        self.progress.notify_all();
    }

    pub fn is_aborted(&self) -> bool { self.state().aborted }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering::*};
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn workers_wait_for_release() {
        let barrier = PhaseBarrier::new(3);
        let started = AtomicUsize::new(0);
        thread::scope(|s| {
            for _ in 0..3 {
                s.spawn(|| {
                    for phase in 0..4 {
                        barrier.ready(phase).unwrap();
                        started.fetch_add(1, SeqCst);
                        barrier.finish();
                    }
                });
            }
            for phase in 0..4 {
                barrier.wait_ready().unwrap();
                thread::sleep(Duration::from_millis(5));
                // nobody may run ahead of the release
                assert_eq!(started.load(SeqCst), 3 * phase);
                barrier.release();
                barrier.wait_finished().unwrap();
                assert_eq!(started.load(SeqCst), 3 * (phase + 1));
            }
        });
    }

    #[test]
    fn abort_wakes_blocked_workers() {
        let barrier = PhaseBarrier::new(2);
        thread::scope(|s| {
            let waiter = s.spawn(|| barrier.ready(0));
            while barrier.state().ready == 0 { thread::yield_now(); }
            barrier.abort();
            assert!(matches!(waiter.join().unwrap(), Err(BenchError::Aborted)));
        });
        assert!(barrier.is_aborted());
        assert!(barrier.wait_ready().is_err());
        assert!(barrier.wait_finished().is_err());
    }

    #[test]
    fn abort_wakes_a_waiting_driver() {
        let barrier = PhaseBarrier::new(4);
        thread::scope(|s| {
            let driver = s.spawn(|| barrier.wait_finished());
            thread::sleep(Duration::from_millis(5));
            barrier.abort();
            assert!(driver.join().unwrap().is_err());
        });
    }
}
