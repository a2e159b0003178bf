use rand::Rng;
use std::{fmt, hint::black_box, str::FromStr};

use crate::access::Access;
use crate::error::BenchError;

/// How operations are classified as reads or writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mix {
    /// Writes spread evenly; exactly `floor(iterations * f)` per thread.
    FixedRatio,
    /// Every operation independently is a write with probability `f`.
    Random,
}

impl FromStr for Mix {
    type Err = BenchError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" | "fixed-ratio" => Ok(Mix::FixedRatio),
            "random" => Ok(Mix::Random),
            _ => Err(BenchError::UnknownMix(s.to_owned())),
        }
    }
}

impl fmt::Display for Mix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mix::FixedRatio => f.write_str("fixed"),
            Mix::Random => f.write_str("random"),
        }
    }
}

/// Simulated critical-section cost, in busy-loop iterations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Work {
    pub read: u32,
    pub write: u32,
}

impl Work {
    pub const NONE: Work = Work { read: 0, write: 0 };

    pub fn units(&self, access: Access) -> u32 {
        match access {
            Access::Read => self.read,
            Access::Write => self.write,
        }
    }
}

impl Default for Work {
    fn default() -> Self { Work { read: 100, write: 1000 } }
}

pub fn busy_work(units: u32) {
    for i in 0..units { black_box(i); }
}

/// Writes per thread under [`Mix::FixedRatio`]: `iterations * f` rounded
/// down. The product is nudged up by a few ulps first so binary
/// representation error cannot turn 0.29 * 100 into 28.
pub fn write_count(iterations: usize, write_fraction: f64) -> usize {
    let product = iterations as f64 * write_fraction;
    let writes = (product + product * 4.0 * f64::EPSILON).floor() as usize;
    writes.min(iterations)
}

/// One thread's operation sequence, generated before the run and replayed
/// unchanged against every lock.
#[derive(Clone, Debug)]
pub struct Schedule {
    ops: Box<[Access]>,
    writes: usize,
}

impl Schedule {
    pub fn fixed_ratio(iterations: usize, write_fraction: f64) -> Self {
        let writes = write_count(iterations, write_fraction);
        // op j is a write when the running quota floor(j * W / I) steps up
        let ops = (0..iterations)
            .map(|j| {
                if (j + 1) * writes / iterations > j * writes / iterations {
                    Access::Write
                } else {
                    Access::Read
                }
            })
            .collect();
        Schedule { ops, writes }
    }

    /// `write_fraction` must lie in `[0, 1]`.
    pub fn random<R: Rng + ?Sized>(iterations: usize, write_fraction: f64,
                                   rng: &mut R) -> Self {
        let ops: Box<[Access]> = (0..iterations)
            .map(|_| {
                if rng.gen_bool(write_fraction) { Access::Write } else { Access::Read }
            })
            .collect();
        let writes = ops.iter().filter(|access| access.is_write()).count();
        Schedule { ops, writes }
    }

    pub fn ops(&self) -> &[Access] { &self.ops }
    pub fn writes(&self) -> usize { self.writes }
    pub fn reads(&self) -> usize { self.ops.len() - self.writes }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn fixed_ratio_writes_every_tenth_op() {
        let schedule = Schedule::fixed_ratio(10_000, 0.1);
        assert_eq!(schedule.writes(), 1000);
        assert_eq!(schedule.reads(), 9000);
        for (j, access) in schedule.ops().iter().enumerate() {
            assert_eq!(access.is_write(), j % 10 == 9, "op {}", j);
        }
    }

    #[test]
    fn fixed_ratio_count_is_rounded_down() {
        for (iterations, fraction, expected) in [
            (100, 0.29, 29),
            (7, 0.5, 3),
            (3, 0.1, 0),
            (10, 0.0, 0),
            (10, 1.0, 10),
            (9, 1.0 / 3.0, 3),
        ] {
            let schedule = Schedule::fixed_ratio(iterations, fraction);
            assert_eq!(schedule.writes(), expected, "{} x {}", iterations, fraction);
            let counted = schedule.ops().iter().filter(|a| a.is_write()).count();
            assert_eq!(counted, expected);
        }
    }

    #[test]
    fn write_count_survives_large_products() {
        // 0.29 * 1e8 comes out as 28999999.999999996
        assert_eq!(write_count(100_000_000, 0.29), 29_000_000);
        assert_eq!(write_count(100_000_000, 0.58), 58_000_000);
        assert_eq!(write_count(700_000_000, 0.7), 490_000_000);
        assert_eq!(write_count(100_000_001, 0.5), 50_000_000);
    }

    #[test]
    fn random_mix_is_reproducible_from_a_seed() {
        let a = Schedule::random(500, 0.3, &mut StdRng::seed_from_u64(7));
        let b = Schedule::random(500, 0.3, &mut StdRng::seed_from_u64(7));
        assert_eq!(a.ops(), b.ops());
        assert_eq!(a.writes(), b.writes());
        assert!(a.writes() > 50 && a.writes() < 250);
    }

    #[test]
    fn random_mix_honours_the_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(Schedule::random(100, 0.0, &mut rng).writes(), 0);
        assert_eq!(Schedule::random(100, 1.0, &mut rng).writes(), 100);
    }

    #[test]
    fn parses_mix_names() {
        assert_eq!("fixed".parse::<Mix>().ok(), Some(Mix::FixedRatio));
        assert_eq!("Random".parse::<Mix>().ok(), Some(Mix::Random));
        assert!("bursty".parse::<Mix>().is_err());
    }
}
