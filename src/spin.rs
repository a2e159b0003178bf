use rand::random;
use std::{cmp::min, fmt, hint, str::FromStr, thread, time::Duration};

use crate::error::BenchError;

/// How a busy-waiting lock passes the time between two failed attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpinPolicy {
    /// Pure busy-wait with a spin-loop hint.
    Spin,
    /// Give the rest of the time slice back to the scheduler.
    Yield,
    /// Sleep a random delay below a limit that doubles on every failure.
    Backoff { min: Duration, max: Duration },
}

impl SpinPolicy {
    pub const DEFAULT_BACKOFF: SpinPolicy = SpinPolicy::Backoff {
        min: Duration::from_micros(1),
        max: Duration::from_millis(1),
    };

    pub fn spinner(self) -> Spinner {
        match self {
            SpinPolicy::Spin => Spinner::Spin,
            SpinPolicy::Yield => Spinner::Yield,
            SpinPolicy::Backoff { min, max } => {
                Spinner::Backoff(Backoff::new(min, max))
            }
        }
    }

    pub fn validate(self) -> Result<(), BenchError> {
        match self {
            SpinPolicy::Backoff { min, max } if min.is_zero() || min > max => {
                Err(BenchError::Backoff)
            }
            _ => Ok(()),
        }
    }
}

impl Default for SpinPolicy {
    fn default() -> Self { SpinPolicy::Yield }
}

impl FromStr for SpinPolicy {
    type Err = BenchError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spin" => Ok(SpinPolicy::Spin),
            "yield" => Ok(SpinPolicy::Yield),
            "backoff" => Ok(SpinPolicy::DEFAULT_BACKOFF),
            _ => Err(BenchError::UnknownPolicy(s.to_owned())),
        }
    }
}

impl fmt::Display for SpinPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpinPolicy::Spin => f.write_str("spin"),
            SpinPolicy::Yield => f.write_str("yield"),
            SpinPolicy::Backoff { min, max } => {
                write!(f, "backoff ({:?}..{:?})", min, max)
            }
        }
    }
}

/// Per-acquisition waiting state. Created fresh by every `acquire`.
pub enum Spinner {
    Spin,
    Yield,
    Backoff(Backoff),
}

impl Spinner {
    #[inline]
    pub fn spin(&mut self) {
        match self {
            Spinner::Spin => hint::spin_loop(),
            Spinner::Yield => thread::yield_now(),
            Spinner::Backoff(backoff) => backoff.backoff(),
        }
    }
}

pub struct Backoff {
    limit: Duration,
    max_limit: Duration
}

impl Backoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        Backoff { limit: min, max_limit: max }
    }
    pub fn backoff(&mut self) {
        let delay = random_duration(self.limit);
        self.limit = min(2 * self.limit, self.max_limit);
        thread::sleep(delay);
    }
}

fn random_duration(limit: Duration) -> Duration {
    let nanos = random::<u64>() % (limit.as_nanos() as u64).max(1);
    Duration::from_nanos(nanos)
}
