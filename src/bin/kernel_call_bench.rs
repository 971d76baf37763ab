use clap::Parser;
use kernel_call_bench::benches::file_read::{ReadSource, DEFAULT_LEN, DEFAULT_PATH};
use kernel_call_bench::harness::{Harness, ParamOverrides, DEFAULT_PAUSE};
use kernel_call_bench::schema::{BenchReport, Measurement, RunMeta};
use kernel_call_bench::timer::{self, LibraryClock, SyscallClock};
use kernel_call_bench::{BenchConfig, Mode};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kernel-call-bench")]
#[command(about = "Best-of-N latency of clock syscalls and mmap vs read file I/O")]
struct Args {
    /// Which benchmark families to run.
    #[arg(value_enum, ignore_case = true, default_value_t = Mode::All)]
    mode: Mode,

    /// Workload calls per timed batch (0 or absent: family default).
    calls: Option<u64>,

    /// Batches per round; the fastest is kept (0 or absent: family default).
    iterations: Option<u64>,

    /// Rounds per workload; the fastest is kept (0 or absent: family default).
    repetitions: Option<u64>,

    /// Source file for the file read family.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_PATH)]
    path: PathBuf,

    /// Bytes read per call in the file read family.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_LEN)]
    len: usize,

    /// Pause between rounds, in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_PAUSE.as_millis() as u64)]
    pause_ms: u64,

    /// Print a JSON report instead of the text summary. Progress goes to stderr.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Write the JSON report to this file (implies --json).
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

fn now_utc_rfc3339() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("unix:{secs}")
}

fn git_sha_short() -> Option<String> {
    std::env::var("GIT_SHA")
        .ok()
        .or_else(|| std::env::var("GITHUB_SHA").ok())
        .map(|s| s.chars().take(12).collect())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// `clock.syscall` -> `syscall`
fn short_name(m: &Measurement) -> &str {
    m.name
        .strip_prefix(m.family.as_str())
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(&m.name)
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    init_tracing();

    timer::probe(&mut LibraryClock)?;
    timer::probe(&mut SyscallClock)?;

    let cfg = BenchConfig {
        overrides: ParamOverrides {
            calls: args.calls,
            iterations: args.iterations,
            repetitions: args.repetitions,
        },
        source: ReadSource::new(args.path.clone(), args.len),
    };
    let mut harness = Harness::new(LibraryClock).with_pause(Duration::from_millis(args.pause_ms));

    let json = args.json || args.out.is_some();
    let mut progress: Box<dyn Write> = if json {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    };

    let mut measurements = Vec::new();
    for (i, family) in args.mode.families().iter().enumerate() {
        if i > 0 {
            writeln!(progress)?;
        }
        write!(progress, "{}: ", family.title())?;
        progress.flush()?;

        let ms = family.run(&mut harness, &cfg, progress.as_mut())?;

        writeln!(progress)?;
        if !json {
            for m in &ms {
                writeln!(progress, "    {}: {} ns", short_name(m), m.best_ns_per_call)?;
            }
        }
        progress.flush()?;
        measurements.extend(ms);
    }

    if !json {
        return Ok(());
    }

    let report = BenchReport {
        run: RunMeta {
            schema_version: 1,
            bench_version: env!("CARGO_PKG_VERSION").to_string(),
            mode: args.mode.as_str().to_string(),
            timestamp_utc: now_utc_rfc3339(),
            git_sha: git_sha_short(),
        },
        measurements,
    };

    let json = serde_json::to_string_pretty(&report).map_err(io::Error::other)?;
    if let Some(out) = args.out {
        fs::write(out, json)?;
    } else {
        println!("{json}");
    }

    Ok(())
}
