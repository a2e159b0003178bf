use std::fmt;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use crate::access::Access;
use crate::stats::{summarize_thread_means, Summary};
use crate::Str;

/// Everything one worker measured against one lock.
#[derive(Clone, Debug)]
pub struct ThreadSamples {
    pub thread: usize,
    /// When the worker started its timed operations.
    pub started: Instant,
    /// When the worker finished its last operation.
    pub finished: Instant,
    /// Acquire latencies in nanoseconds, in operation order.
    pub reads: Vec<u64>,
    pub writes: Vec<u64>,
}

impl ThreadSamples {
    pub fn latencies(&self, access: Access) -> &[u64] {
        match access {
            Access::Read => &self.reads,
            Access::Write => &self.writes,
        }
    }
}

#[derive(Clone, Debug)]
pub struct VariantReport {
    pub name: Str,
    pub code: Str,
    /// Driver's view of the phase: from release to the last finish.
    pub started: Instant,
    pub stopped: Instant,
    pub expected: u64,
    pub counter: u64,
    pub read: Option<Summary>,
    pub write: Option<Summary>,
    /// One entry per worker, in worker order.
    pub threads: Vec<ThreadSamples>,
}

impl VariantReport {
    pub fn new(name: Str, code: Str, started: Instant, stopped: Instant,
               expected: u64, counter: u64, threads: Vec<ThreadSamples>) -> Self {
        let read = summarize_thread_means(threads.iter().map(|t| &t.reads[..]));
        let write = summarize_thread_means(threads.iter().map(|t| &t.writes[..]));
        VariantReport {
            name, code, started, stopped, expected, counter, read, write, threads,
        }
    }

    pub fn elapsed(&self) -> Duration { self.stopped - self.started }

    pub fn passed(&self) -> bool { self.counter == self.expected }

    pub fn summary(&self, access: Access) -> Option<Summary> {
        match access {
            Access::Read => self.read,
            Access::Write => self.write,
        }
    }

    /// Raw dump file name, e.g. `TICKET-r-tc_8-wf_0.1-wt_1000-rt_100`.
    pub fn file_name(&self, access: Access, tag: &str) -> String {
        let kind = match access {
            Access::Read => 'r',
            Access::Write => 'w',
        };
        format!("{}-{}-{}", self.code, kind, tag)
    }

    /// Writes every thread's latencies for `access`, space separated,
    /// threads in order.
    pub fn write_latencies<W: Write>(&self, access: Access, mut out: W) -> io::Result<()> {
        for thread in &self.threads {
            for latency in thread.latencies(access) {
                write!(out, "{} ", latency)?;
            }
        }
        out.flush()
    }
}

#[derive(Clone, Debug)]
pub struct RunReport {
    pub tag: String,
    pub variants: Vec<VariantReport>,
}

impl RunReport {
    pub fn variant(&self, code: &str) -> Option<&VariantReport> {
        self.variants.iter().find(|v| v.code.eq_ignore_ascii_case(code))
    }
}

struct Cell(Option<Summary>);

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(summary) => f.pad(&summary.to_string()),
            None => f.pad("-"),
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<36} {:>12} {:>24} {:>24}",
            "lock", "elapsed ms", "read ns (mean ± sd)", "write ns (mean ± sd)")?;
        for variant in &self.variants {
            writeln!(f, "{:<36} {:>12} {:>24} {:>24}",
                variant.name,
                variant.elapsed().as_millis(),
                Cell(variant.read),
                Cell(variant.write))?;
        }
        Ok(())
    }
}
