use lockbench::*;
use log::{error, info, LevelFilter};
use std::{fs::{self, File}, io::BufWriter, path::PathBuf, process::exit, time::Duration};
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "lockbench", about = "Benchmark lock algorithms under contention")]
struct Opt {
    #[structopt(short = "t", long = "threads", help = "Number of worker threads")]
    threads: usize,
    #[structopt(short = "w", long = "write-fraction", help = "Share of writes, 0-1")]
    write_fraction: f64,
    #[structopt(short = "W", long = "write-time", default_value = "1000",
        help = "Simulated write cost, in busy-loop iterations")]
    write_time: u32,
    #[structopt(short = "r", long = "read-time", default_value = "100",
        help = "Simulated read cost, in busy-loop iterations")]
    read_time: u32,
    #[structopt(short = "n", long = "iterations", default_value = "10000",
        help = "Operations per thread per lock")]
    iterations: usize,
    #[structopt(long = "mix", default_value = "random", help = "fixed or random")]
    mix: Mix,
    #[structopt(long = "seed", help = "Seed for the random mix")]
    seed: Option<u64>,
    #[structopt(long = "spin", default_value = "yield", help = "spin, yield or backoff")]
    spin: SpinPolicy,
    #[structopt(long = "backoff-min-ns", help = "Initial backoff limit")]
    backoff_min_ns: Option<u64>,
    #[structopt(long = "backoff-max-ns", help = "Largest backoff limit")]
    backoff_max_ns: Option<u64>,
    #[structopt(long = "locks", use_delimiter = true,
        help = "Lock codes to run, in order [default: all]")]
    locks: Vec<LockKind>,
    #[structopt(short = "o", long = "output", parse(from_os_str),
        help = "Directory for raw latency dumps")]
    output: Option<PathBuf>,
}

impl Opt {
    fn config(&self) -> BenchConfig {
        let spin = match self.spin {
            SpinPolicy::Backoff { min, max } => SpinPolicy::Backoff {
                min: self.backoff_min_ns.map(Duration::from_nanos).unwrap_or(min),
                max: self.backoff_max_ns.map(Duration::from_nanos).unwrap_or(max),
            },
            policy => policy,
        };
        let locks = if self.locks.is_empty() {
            LockKind::ALL.to_vec()
        } else {
            self.locks.clone()
        };
        BenchConfig {
            threads: self.threads,
            write_fraction: self.write_fraction,
            iterations: self.iterations,
            work: Work { read: self.read_time, write: self.write_time },
            mix: self.mix,
            seed: self.seed,
            spin,
            locks,
        }
    }
}

fn run(opt: Opt) -> Result<()> {
    let config = opt.config();
    let harness = Harness::new(config)?;
    println!("{}", harness.config());
    let report = harness.run()?;
    print!("{}", report);

    if let Some(dir) = &opt.output {
        fs::create_dir_all(dir)?;
        for variant in &report.variants {
            for access in [Access::Read, Access::Write] {
                let path = dir.join(variant.file_name(access, &report.tag));
                variant.write_latencies(access, BufWriter::new(File::create(&path)?))?;
                info!("wrote {}", path.display());
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();
    let opt = Opt::from_args();
    if let Err(e) = run(opt) {
        error!("{}", e);
        exit(1);
    }
}
