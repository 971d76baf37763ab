use std::io::{self, Write};

use clap::ValueEnum;
use tracing::info;

pub mod benches;
pub mod harness;
pub mod schema;
pub mod timer;
pub mod workload;

use benches::file_read::ReadSource;
use harness::{BenchParams, Harness, ParamOverrides};
use schema::Measurement;
use timer::TimeSource;

/// Which benchmark families to run.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum Mode {
    /// Clock reads, then file reads.
    #[default]
    #[value(alias = "a")]
    All,
    /// Raw syscall vs libc `clock_gettime(CLOCK_MONOTONIC)`.
    #[value(aliases = ["t", "clock"])]
    Time,
    /// `mmap` + copy vs `read` of a fixed-size source.
    #[value(aliases = ["f", "io"])]
    File,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::All => "all",
            Mode::Time => "time",
            Mode::File => "file",
        }
    }

    pub fn families(&self) -> &'static [Family] {
        match self {
            Mode::All => &[Family::Clock, Family::FileRead],
            Mode::Time => &[Family::Clock],
            Mode::File => &[Family::FileRead],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    Clock,
    FileRead,
}

impl Family {
    /// Heading printed before the family's progress markers.
    pub fn title(&self) -> &'static str {
        match self {
            Family::Clock => "clock_gettime",
            Family::FileRead => "file read",
        }
    }

    pub fn default_params(&self) -> BenchParams {
        match self {
            Family::Clock => BenchParams::fixed(100_000, 32, 5),
            Family::FileRead => BenchParams::fixed(100, 128, 5),
        }
    }

    pub fn run<C: TimeSource>(
        &self,
        harness: &mut Harness<C>,
        cfg: &BenchConfig,
        progress: &mut dyn Write,
    ) -> io::Result<Vec<Measurement>> {
        let params = cfg.overrides.resolve(self.default_params())?;
        info!(
            family = self.title(),
            calls = params.calls(),
            iterations = params.iterations(),
            repetitions = params.repetitions(),
            "running family"
        );
        match self {
            Family::Clock => benches::clock::run(harness, &params, progress),
            Family::FileRead => benches::file_read::run(harness, &params, &cfg.source, progress),
        }
    }
}

/// Everything the families need from the command line.
#[derive(Clone, Debug, Default)]
pub struct BenchConfig {
    pub overrides: ParamOverrides,
    pub source: ReadSource,
}
