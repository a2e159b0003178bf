//! Drives every configured lock through one timed phase on a fixed pool of
//! workers and checks for lost updates after each phase.
//!
//! Workers are spawned once and reused across phases. Per phase the driver
//! waits for all workers to be ready, releases them, waits for all of them
//! to finish and then compares the lock's shared counter with the number of
//! write operations issued. A mismatch aborts the whole run.

use log::{debug, error, info};
use rand::{random, rngs::StdRng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering::*};
use std::thread;
use std::time::Instant;

use crate::access::Access;
use crate::barrier::PhaseBarrier;
use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::lock::{dispatch, Lock, LockRef, Variant};
use crate::pad::CachePadded;
use crate::report::{RunReport, ThreadSamples, VariantReport};
use crate::workload::{busy_work, Mix, Schedule, Work};

/// Counter bumped once per write, inside the lock under test.
#[derive(Default)]
pub struct SharedCounter(CachePadded<AtomicU64>);

impl SharedCounter {
    /// Not an atomic increment: the load and the store are separate, so two
    /// writers inside the lock at once lose an update.
    #[inline]
    pub fn bump(&self) {
        let value = self.0.load(Relaxed);
        self.0.store(value + 1, Relaxed);
    }
    pub fn get(&self) -> u64 { self.0.load(Relaxed) }
}

pub struct Harness {
    config: BenchConfig,
    locks: Vec<Variant>,
    schedules: Vec<Schedule>,
}

struct PhaseWindow {
    started: Instant,
    stopped: Instant,
    counter: u64,
}

impl Harness {
    /// Validates `config`, builds every lock and every thread's schedule.
    /// Nothing is spawned yet.
    pub fn new(config: BenchConfig) -> Result<Self> {
        config.validate()?;
        let locks = config.locks.iter()
            .map(|kind| kind.build(config.threads, config.spin))
            .collect();
        let schedules = match config.mix {
            Mix::FixedRatio => {
                let schedule = Schedule::fixed_ratio(config.iterations, config.write_fraction);
                vec![schedule; config.threads]
            }
            Mix::Random => {
                let seed = config.seed.unwrap_or_else(random);
                info!("workload seed: {}", seed);
                let mut rng = StdRng::seed_from_u64(seed);
                (0..config.threads)
                    .map(|_| Schedule::random(config.iterations, config.write_fraction, &mut rng))
                    .collect()
            }
        };
        Ok(Harness { config, locks, schedules })
    }

    pub fn config(&self) -> &BenchConfig { &self.config }
    pub fn locks(&self) -> &[Variant] { &self.locks }
    pub fn schedules(&self) -> &[Schedule] { &self.schedules }

    /// What every lock's counter must read after its phase.
    pub fn expected_writes(&self) -> u64 {
        self.schedules.iter().map(|s| s.writes() as u64).sum()
    }

    /// Runs every phase. Fails on the first lock whose counter is off, and
    /// does not go on to the remaining locks.
    pub fn run(&self) -> Result<RunReport> {
        let threads = self.config.threads;
        let expected = self.expected_writes();
        let barrier = PhaseBarrier::new(threads);
        let counters: Vec<SharedCounter> = self.locks.iter()
            .map(|_| SharedCounter::default())
            .collect();
        info!("{} threads, {} locks, {} writes expected per lock",
            threads, self.locks.len(), expected);

        let (windows, per_thread) = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(threads);
            for (id, schedule) in self.schedules.iter().enumerate() {
                let worker = Worker {
                    id,
                    locks: &self.locks,
                    counters: &counters,
                    barrier: &barrier,
                    schedule,
                    work: self.config.work,
                };
                let spawned = thread::Builder::new()
                    .name(format!("worker-{}", id))
                    .spawn_scoped(scope, move || worker.run());
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(err) => {
                        barrier.abort();
                        return Err(BenchError::from(err));
                    }
                }
            }

            let driven = self.drive(&barrier, &counters, expected);
            if driven.is_err() { barrier.abort(); }

            let mut per_thread = Vec::with_capacity(threads);
            let mut failure = None;
            for handle in handles {
                match handle.join() {
                    Ok(Ok(samples)) => per_thread.push(samples),
                    Ok(Err(BenchError::Aborted)) => {}
                    Ok(Err(err)) => { failure.get_or_insert(err); }
                    Err(_) => { failure.get_or_insert(BenchError::WorkerPanicked); }
                }
            }
            match (driven, failure) {
                (Err(BenchError::Aborted), Some(cause)) => Err(cause),
                (Err(err), _) => Err(err),
                (Ok(_), Some(cause)) => Err(cause),
                (Ok(windows), None) => Ok((windows, per_thread)),
            }
        })?;

        let mut by_lock: Vec<Vec<ThreadSamples>> = self.locks.iter()
            .map(|_| Vec::with_capacity(threads))
            .collect();
        for samples in per_thread {
            for (phase, sample) in samples.into_iter().enumerate() {
                by_lock[phase].push(sample);
            }
        }
        let variants = self.locks.iter()
            .zip(windows)
            .zip(by_lock)
            .map(|((lock, window), samples)| {
                VariantReport::new(lock.name(), lock.code(), window.started,
                    window.stopped, expected, window.counter, samples)
            })
            .collect();
        Ok(RunReport { tag: self.config.tag(), variants })
    }

    fn drive(&self, barrier: &PhaseBarrier, counters: &[SharedCounter],
             expected: u64) -> Result<Vec<PhaseWindow>> {
        let total = self.locks.len();
        let mut windows = Vec::with_capacity(total);
        for (phase, (lock, counter)) in self.locks.iter().zip(counters).enumerate() {
            barrier.wait_ready()?;
            info!("begin testing ({}/{}) {}", phase + 1, total, lock.name());
            let started = Instant::now();
            barrier.release();
            barrier.wait_finished()?;
            let stopped = Instant::now();

            let actual = counter.get();
            if actual != expected {
                error!("{} lost updates: counter {} after {} writes",
                    lock.name(), actual, expected);
                return Err(BenchError::Violation { lock: lock.name(), expected, actual });
            }
            info!("{} passed in {} ms", lock.name(), (stopped - started).as_millis());
            windows.push(PhaseWindow { started, stopped, counter: actual });
        }
        Ok(windows)
    }
}

struct Worker<'a> {
    id: usize,
    locks: &'a [Variant],
    counters: &'a [SharedCounter],
    barrier: &'a PhaseBarrier,
    schedule: &'a Schedule,
    work: Work,
}

/// Tears the run down if the owning worker panics, so the driver does not
/// wait for it forever.
struct AbortOnPanic<'a>(&'a PhaseBarrier);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() { self.0.abort(); }
    }
}

impl Worker<'_> {
    fn run(self) -> Result<Vec<ThreadSamples>> {
        let _abort = AbortOnPanic(self.barrier);
        let mut phases = Vec::with_capacity(self.locks.len());
        for (phase, lock) in self.locks.iter().enumerate() {
            self.barrier.ready(phase)?;
            let counter = &self.counters[phase];
            match dispatch!(lock, lock => self.run_phase(lock, counter)) {
                Ok(samples) => {
                    self.barrier.finish();
                    debug!("worker {} done with {}", self.id, lock.code());
                    phases.push(samples);
                }
                Err(err) => {
                    self.barrier.abort();
                    return Err(err);
                }
            }
        }
        Ok(phases)
    }

    fn run_phase<L: Lock>(&self, lock: &L, counter: &SharedCounter) -> Result<ThreadSamples> {
        let mut handle = lock.borrow()?;
        let mut reads = Vec::with_capacity(self.schedule.reads());
        let mut writes = Vec::with_capacity(self.schedule.writes());
        let started = Instant::now();
        for &access in self.schedule.ops() {
            let begin = Instant::now();
            let guard = handle.acquire(access);
            let latency = begin.elapsed().as_nanos() as u64;
            if access.is_write() { counter.bump(); }
            busy_work(self.work.units(access));
            drop(guard);
            match access {
                Access::Read => reads.push(latency),
                Access::Write => writes.push(latency),
            }
        }
        let finished = Instant::now();
        Ok(ThreadSamples { thread: self.id, started, finished, reads, writes })
    }
}

#[cfg(test)]
mod tests {
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use std::sync::Mutex;

    use super::*;
    use crate::lock::LockKind;
    use crate::spin::SpinPolicy;

    fn config(threads: usize, locks: Vec<LockKind>) -> BenchConfig {
        BenchConfig {
            threads,
            write_fraction: 0.5,
            iterations: 100,
            work: Work { read: 10, write: 20 },
            mix: Mix::FixedRatio,
            seed: None,
            spin: SpinPolicy::Yield,
            locks,
        }
    }

    struct Capture;

    static LOGGED: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

    impl Log for Capture {
        fn enabled(&self, _: &Metadata) -> bool { true }
        fn log(&self, record: &Record) {
            LOGGED.lock().unwrap().push((record.level(), record.args().to_string()));
        }
        fn flush(&self) {}
    }

    #[test]
    fn short_counter_is_logged_and_fails_the_phase() {
        static CAPTURE: Capture = Capture;
        if log::set_logger(&CAPTURE).is_ok() {
            log::set_max_level(LevelFilter::Debug);
        }
        let harness = Harness::new(config(1, vec![LockKind::Mutex])).unwrap();
        let barrier = PhaseBarrier::new(1);
        let counters = [SharedCounter::default()];
        // a worker that checks in but never writes
        let result = thread::scope(|s| {
            s.spawn(|| {
                barrier.ready(0).unwrap();
                barrier.finish();
            });
            harness.drive(&barrier, &counters, harness.expected_writes())
        });
        match result {
            Err(BenchError::Violation { expected: 50, actual: 0, .. }) => {}
            other => panic!("expected a violation, got {:?}", other.map(|w| w.len())),
        }
        let logged = LOGGED.lock().unwrap();
        assert!(logged.iter().any(|(level, message)| {
            *level == Level::Error && message.contains("lost updates: counter 0 after 50")
        }));
    }

    #[test]
    fn shared_counter_counts_serial_bumps() {
        let counter = SharedCounter::default();
        for _ in 0..10 { counter.bump(); }
        assert_eq!(counter.get(), 10);
    }

    #[test]
    fn rejects_invalid_config_before_spawning() {
        assert!(matches!(Harness::new(config(0, LockKind::ALL.to_vec())),
            Err(BenchError::NoThreads)));
    }

    #[test]
    fn random_schedules_follow_the_seed() {
        let mut cfg = config(3, vec![LockKind::Mutex]);
        cfg.mix = Mix::Random;
        cfg.seed = Some(42);
        let a = Harness::new(cfg.clone()).unwrap();
        let b = Harness::new(cfg).unwrap();
        for (x, y) in a.schedules().iter().zip(b.schedules()) {
            assert_eq!(x.ops(), y.ops());
        }
        assert_eq!(a.expected_writes(), b.expected_writes());
    }

    #[test]
    fn one_report_per_lock_in_order() {
        let harness = Harness::new(config(3, vec![LockKind::Ticket, LockKind::Tas])).unwrap();
        let report = harness.run().unwrap();
        let codes: Vec<_> = report.variants.iter().map(|v| v.code).collect();
        assert_eq!(codes, ["TICKET", "TS"]);
        for variant in &report.variants {
            assert!(variant.passed());
            assert_eq!(variant.counter, 150);
            assert_eq!(variant.threads.len(), 3);
            for (id, thread) in variant.threads.iter().enumerate() {
                assert_eq!(thread.thread, id);
                assert_eq!(thread.reads.len(), 50);
                assert_eq!(thread.writes.len(), 50);
            }
        }
    }
}
