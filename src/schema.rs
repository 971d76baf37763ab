use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub schema_version: u32,
    pub bench_version: String,
    pub mode: String,
    pub timestamp_utc: String,
    pub git_sha: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    pub family: String,
    pub name: String,
    pub unit: String,

    pub calls: u64,
    pub iterations: u64,
    pub repetitions: u64,

    /// Fastest round's best batch time divided by `calls`.
    pub best_ns_per_call: i64,

    pub bytes_per_call: Option<u64>,

    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchReport {
    pub run: RunMeta,
    pub measurements: Vec<Measurement>,
}
