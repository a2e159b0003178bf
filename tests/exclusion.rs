use lockbench::{BenchConfig, Harness, LockKind, Mix, SpinPolicy, Work};

fn run_all_locks(threads: usize, iterations: usize) {
    let config = BenchConfig {
        threads,
        write_fraction: 0.5,
        iterations,
        work: Work { read: 5, write: 10 },
        mix: Mix::FixedRatio,
        seed: None,
        spin: SpinPolicy::Yield,
        locks: LockKind::ALL.to_vec(),
    };
    let harness = Harness::new(config).unwrap();
    let writes = (iterations / 2) as u64;
    assert_eq!(harness.expected_writes(), threads as u64 * writes);

    let report = harness.run().unwrap();
    assert_eq!(report.variants.len(), LockKind::ALL.len());
    for variant in &report.variants {
        assert!(variant.passed(), "{} failed", variant.name);
        assert_eq!(variant.counter, threads as u64 * writes, "{}", variant.name);
    }
}

#[test]
fn single_thread() {
    run_all_locks(1, 400);
}

#[test]
fn two_threads() {
    run_all_locks(2, 400);
}

#[test]
fn four_threads() {
    run_all_locks(4, 400);
}

#[test]
fn sixteen_threads() {
    run_all_locks(16, 200);
}

#[test]
fn sixty_four_threads() {
    run_all_locks(64, 60);
}

#[test]
fn random_mix_validates_against_per_thread_write_counts() {
    let config = BenchConfig {
        threads: 6,
        write_fraction: 0.3,
        iterations: 300,
        work: Work::NONE,
        mix: Mix::Random,
        seed: Some(2024),
        spin: SpinPolicy::Yield,
        locks: vec![LockKind::Rw, LockKind::Array],
    };
    let harness = Harness::new(config).unwrap();
    let expected: u64 = harness.schedules().iter().map(|s| s.writes() as u64).sum();
    let report = harness.run().unwrap();
    for variant in &report.variants {
        assert_eq!(variant.counter, expected);
        let writes: usize = variant.threads.iter().map(|t| t.writes.len()).sum();
        assert_eq!(writes as u64, expected);
    }
}

#[test]
fn backoff_policy_keeps_exclusion() {
    let config = BenchConfig {
        threads: 4,
        write_fraction: 1.0,
        iterations: 100,
        work: Work::NONE,
        mix: Mix::FixedRatio,
        seed: None,
        spin: SpinPolicy::DEFAULT_BACKOFF,
        locks: vec![LockKind::Tas, LockKind::Ttas, LockKind::Ticket, LockKind::Array],
    };
    let report = Harness::new(config).unwrap().run().unwrap();
    for variant in &report.variants {
        assert_eq!(variant.counter, 400, "{}", variant.name);
        assert!(variant.read.is_none());
    }
}
