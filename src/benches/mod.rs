//! Benchmark families: competing workloads run back to back under identical parameters.


use std::io::{self, Write};

use serde_json::Value;
use tracing::info;

use crate::harness::{BenchParams, Harness};
use crate::schema::Measurement;
use crate::timer::TimeSource;
use crate::workload::Workload;

/// A named workload competing within a family.
pub struct Contender<'a> {
    pub name: &'static str,
    pub workload: Box<dyn Workload + 'a>,
}

impl<'a> Contender<'a> {
    pub fn new(name: &'static str, workload: impl Workload + 'a) -> Self {
        Self {
            name,
            workload: Box::new(workload),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Estimate {
    pub name: &'static str,
    pub ns_per_call: i64,
}

/// Run every contender once, in the given order, with the same parameters.
pub fn run_family<C: TimeSource>(
    harness: &mut Harness<C>,
    params: &BenchParams,
    contenders: Vec<Contender<'_>>,
    progress: &mut dyn Write,
) -> io::Result<Vec<Estimate>> {
    let mut out = Vec::with_capacity(contenders.len());
    for mut c in contenders {
        let ns_per_call = harness.run(c.workload.as_mut(), params, progress)?;
        info!(workload = c.name, ns_per_call, "estimate");
        out.push(Estimate {
            name: c.name,
            ns_per_call,
        });
    }
    Ok(out)
}

pub(crate) fn to_measurement(
    family: &str,
    est: &Estimate,
    params: &BenchParams,
    bytes_per_call: Option<u64>,
    extra: Value,
) -> Measurement {
    Measurement {
        family: family.to_string(),
        name: format!("{family}.{}", est.name),
        unit: "ns/call".to_string(),
        calls: params.calls(),
        iterations: params.iterations(),
        repetitions: params.repetitions(),
        best_ns_per_call: est.ns_per_call,
        bytes_per_call,
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::sim::SimClock;
    use std::time::Duration;

    #[test]
    fn test_costs_keep_their_ratio() {
        let clock = SimClock::new();
        let contenders = vec![
            Contender::new("cheap", clock.workload(50)),
            Contender::new("dear", clock.workload(200)),
        ];
        let mut h = Harness::new(clock).with_pause(Duration::ZERO);
        let params = BenchParams::new(1000, 8, 3).unwrap();

        let est = run_family(&mut h, &params, contenders, &mut io::sink()).unwrap();

        assert_eq!(est[0].ns_per_call, 50);
        assert_eq!(est[1].ns_per_call, 200);
        assert_eq!(est[1].ns_per_call / est[0].ns_per_call, 4);
    }

    #[test]
    fn test_estimates_follow_contender_order() {
        let clock = SimClock::new();
        let contenders = vec![
            Contender::new("b", clock.workload(9)),
            Contender::new("a", clock.workload(3)),
            Contender::new("c", clock.workload(6)),
        ];
        let mut h = Harness::new(clock).with_pause(Duration::ZERO);
        let params = BenchParams::new(10, 2, 2).unwrap();
        let mut progress = Vec::new();

        let est = run_family(&mut h, &params, contenders, &mut progress).unwrap();

        let names: Vec<_> = est.iter().map(|e| e.name).collect();
        assert_eq!(names, ["b", "a", "c"]);
        assert_eq!(progress.len(), 3 * 2);
    }

    #[test]
    fn test_failing_contender_stops_family() {
        let clock = SimClock::new();
        let mut later_ran = false;
        let contenders = vec![
            Contender::new("broken", || -> io::Result<()> {
                Err(io::Error::other("no source"))
            }),
            Contender::new("fine", || -> io::Result<()> {
                later_ran = true;
                Ok(())
            }),
        ];
        let mut h = Harness::new(clock).with_pause(Duration::ZERO);
        let params = BenchParams::new(1, 1, 1).unwrap();

        assert!(run_family(&mut h, &params, contenders, &mut io::sink()).is_err());
        assert!(!later_ran);
    }

    #[test]
    fn test_measurement_carries_params() {
        let params = BenchParams::new(10, 20, 3).unwrap();
        let est = Estimate {
            name: "mmap",
            ns_per_call: 4200,
        };
        let m = to_measurement("file_read", &est, &params, Some(65536), Value::Null);
        assert_eq!(m.name, "file_read.mmap");
        assert_eq!(m.unit, "ns/call");
        assert_eq!((m.calls, m.iterations, m.repetitions), (10, 20, 3));
        assert_eq!(m.best_ns_per_call, 4200);
        assert_eq!(m.bytes_per_call, Some(65536));
    }
}
