use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::timer::TimeSource;
use crate::workload::Workload;

/// Pause between repetitions so scheduler and thermal noise from one round settles.
pub const DEFAULT_PAUSE: Duration = Duration::from_millis(125);

/// Counts for one benchmark run. All three are always non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BenchParams {
    calls: u64,
    iterations: u64,
    repetitions: u64,
}

impl BenchParams {
    pub fn new(calls: u64, iterations: u64, repetitions: u64) -> io::Result<Self> {
        if calls == 0 || iterations == 0 || repetitions == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "calls, iterations and repetitions must be positive \
                     (got {calls}/{iterations}/{repetitions})"
                ),
            ));
        }
        if i64::try_from(calls).is_err() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("calls out of range: {calls}"),
            ));
        }
        Ok(Self {
            calls,
            iterations,
            repetitions,
        })
    }

    /// Compile-time defaults. Callers pass literal positive values.
    pub(crate) const fn fixed(calls: u64, iterations: u64, repetitions: u64) -> Self {
        Self {
            calls,
            iterations,
            repetitions,
        }
    }

    /// Workload invocations timed together as one batch.
    pub fn calls(&self) -> u64 {
        self.calls
    }

    /// Batches per round; the fastest one is kept.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Rounds per run; the fastest per-call estimate is kept.
    pub fn repetitions(&self) -> u64 {
        self.repetitions
    }
}

/// Externally supplied counts. `None` and `Some(0)` both mean "use the default".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParamOverrides {
    pub calls: Option<u64>,
    pub iterations: Option<u64>,
    pub repetitions: Option<u64>,
}

impl ParamOverrides {
    pub fn resolve(&self, defaults: BenchParams) -> io::Result<BenchParams> {
        let pick = |v: Option<u64>, d: u64| v.filter(|&n| n != 0).unwrap_or(d);
        BenchParams::new(
            pick(self.calls, defaults.calls),
            pick(self.iterations, defaults.iterations),
            pick(self.repetitions, defaults.repetitions),
        )
    }
}

/// Best-of-N latency runner.
///
/// Each run is `repetitions` rounds of `iterations` batches of `calls` invocations. The
/// fastest batch of a round is divided by `calls`, and the fastest round wins. Noise on a
/// preemptible system only ever adds time, so the minimum is the estimate of the
/// uncontended cost; dividing after minimizing amortizes the two clock reads per batch.
pub struct Harness<C> {
    clock: C,
    pause: Duration,
}

impl<C: TimeSource> Harness<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            pause: DEFAULT_PAUSE,
        }
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }

    /// Estimate nanoseconds per call of `workload`.
    ///
    /// Writes one `.` to `progress` after every round. The first workload or clock error
    /// aborts the run.
    pub fn run<W: Workload + ?Sized>(
        &mut self,
        workload: &mut W,
        params: &BenchParams,
        progress: &mut dyn Write,
    ) -> io::Result<i64> {
        // Checked in BenchParams::new.
        let calls = params.calls as i64;
        let mut best_per_call = i64::MAX;

        for rep in 0..params.repetitions {
            let mut best_batch = i64::MAX;

            for _ in 0..params.iterations {
                let before = self.clock.now()?;
                for _ in 0..params.calls {
                    workload.invoke()?;
                }
                let after = self.clock.now()?;

                let elapsed = after.as_nanos() - before.as_nanos();
                if elapsed < 0 {
                    return Err(io::Error::other(format!(
                        "monotonic clock went backwards: batch elapsed {elapsed} ns"
                    )));
                }
                best_batch = best_batch.min(elapsed);
            }

            let per_call = best_batch / calls;
            debug!(rep, best_batch_ns = best_batch, per_call_ns = per_call, "round done");
            best_per_call = best_per_call.min(per_call);

            progress.write_all(b".")?;
            progress.flush()?;
            if !self.pause.is_zero() {
                thread::sleep(self.pause);
            }
        }

        Ok(best_per_call)
    }
}
