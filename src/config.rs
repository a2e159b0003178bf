use std::fmt;

use crate::error::{BenchError, Result};
use crate::lock::LockKind;
use crate::spin::SpinPolicy;
use crate::workload::{Mix, Work};

/// Parameters of one benchmark run.
#[derive(Clone, Debug, PartialEq)]
pub struct BenchConfig {
    pub threads: usize,
    /// Share of operations that write, in `[0, 1]`.
    pub write_fraction: f64,
    /// Operations per thread per lock.
    pub iterations: usize,
    pub work: Work,
    pub mix: Mix,
    /// Seed for [`Mix::Random`]; a fresh one is drawn when absent.
    pub seed: Option<u64>,
    pub spin: SpinPolicy,
    /// Locks to benchmark, in order.
    pub locks: Vec<LockKind>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            threads: 4,
            write_fraction: 0.1,
            iterations: 10_000,
            work: Work::default(),
            mix: Mix::Random,
            seed: None,
            spin: SpinPolicy::default(),
            locks: LockKind::ALL.to_vec(),
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(BenchError::NoThreads);
        }
        if self.iterations == 0 {
            return Err(BenchError::NoIterations);
        }
        if !(0.0..=1.0).contains(&self.write_fraction) {
            return Err(BenchError::WriteFraction(self.write_fraction));
        }
        if self.locks.is_empty() {
            return Err(BenchError::NoLocks);
        }
        self.spin.validate()
    }

    /// Identifies the run parameters in output file names.
    pub fn tag(&self) -> String {
        format!("tc_{}-wf_{:.1}-wt_{}-rt_{}", self.threads,
            self.write_fraction, self.work.write, self.work.read)
    }
}

impl fmt::Display for BenchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "thread number: {}", self.threads)?;
        writeln!(f, "write fraction: {}", self.write_fraction)?;
        writeln!(f, "read fraction: {}", 1.0 - self.write_fraction)?;
        writeln!(f, "write time: {}", self.work.write)?;
        writeln!(f, "read time: {}", self.work.read)?;
        writeln!(f, "iterations: {}", self.iterations)?;
        writeln!(f, "mix: {}", self.mix)?;
        write!(f, "spin: {}", self.spin)
    }
}
