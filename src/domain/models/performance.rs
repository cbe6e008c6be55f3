use serde_derive::Deserialize;
use serde_derive::Serialize;

/// One historical query execution, as recorded in the uploaded query log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: f64,
    pub exec_time_ms: f64,
    #[serde(rename = "query", alias = "query_text", default)]
    pub query_text: String,
}

impl LogEntry {
    pub fn new(timestamp: f64, exec_time_ms: f64, query_text: &str) -> LogEntry {
        return LogEntry {
            timestamp,
            exec_time_ms,
            query_text: query_text.to_string(),
        };
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendPoint {
    pub index: usize,
    pub entry: LogEntry,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PerformanceBucket {
    pub label: &'static str,
    pub lower_bound_ms: f64,
    /// `None` means the bucket is unbounded above.
    pub upper_bound_ms: Option<f64>,
    pub count: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PerformanceStats {
    /// Undefined for an empty log set.
    pub average: Option<f64>,
    /// Undefined for an empty log set.
    pub maximum: Option<f64>,
    pub slow_count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub trend: Vec<TrendPoint>,
    pub buckets: [PerformanceBucket; 4],
    pub stats: PerformanceStats,
}
