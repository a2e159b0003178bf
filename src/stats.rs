use std::fmt;

/// Mean and population standard deviation of a set of values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub std_dev: f64,
    /// How many values went in.
    pub count: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} ± {:.1}", self.mean, self.std_dev)
    }
}

pub fn mean(samples: &[u64]) -> Option<f64> {
    if samples.is_empty() { return None }
    let sum: f64 = samples.iter().map(|&s| s as f64).sum();
    Some(sum / samples.len() as f64)
}

pub fn summarize<I: IntoIterator<Item = f64>>(values: I) -> Option<Summary> {
    let values: Vec<f64> = values.into_iter().collect();
    if values.is_empty() { return None }
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let variance = values.iter()
        .map(|v| (v - mean) * (v - mean))
        .sum::<f64>() / count as f64;
    Some(Summary { mean, std_dev: variance.sqrt(), count })
}

/// Summarizes the per-thread means, not the raw samples: the spread answers
/// how much thread-average latency differed between threads. Threads with
/// no samples are left out.
pub fn summarize_thread_means<'a, I>(threads: I) -> Option<Summary>
where I: IntoIterator<Item = &'a [u64]> {
    summarize(threads.into_iter().filter_map(mean))
}
