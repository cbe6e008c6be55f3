#[cfg(test)]
#[path = "performance_test.rs"]
mod tests;

use crate::domain::models::LogEntry;
use crate::domain::models::PerformanceBucket;
use crate::domain::models::PerformanceReport;
use crate::domain::models::PerformanceStats;
use crate::domain::models::TrendPoint;

/// Executions slower than this are counted as slow.
pub const SLOW_QUERY_MS: f64 = 100.0;

// Upper edges are inclusive: 10ms is fast, 100ms is not yet slow.
const BUCKET_BOUNDS: [(&str, f64, Option<f64>); 4] = [
    ("0–10ms", 0.0, Some(10.0)),
    ("10–50ms", 10.0, Some(50.0)),
    ("50–100ms", 50.0, Some(SLOW_QUERY_MS)),
    ("100ms+", SLOW_QUERY_MS, None),
];

/// Index into the histogram for an execution time. First matching band wins.
pub fn bucket_for(exec_time_ms: f64) -> usize {
    return BUCKET_BOUNDS
        .iter()
        .position(|(_, _, upper)| {
            return match upper {
                Some(upper) => exec_time_ms <= *upper,
                None => true,
            };
        })
        .unwrap_or(BUCKET_BOUNDS.len() - 1);
}

fn trend(logs: &[LogEntry]) -> Vec<TrendPoint> {
    let mut sorted = logs.to_vec();
    // sort_by is stable, equal timestamps keep their log order.
    sorted.sort_by(|a, b| return a.timestamp.total_cmp(&b.timestamp));

    return sorted
        .into_iter()
        .enumerate()
        .map(|(index, entry)| return TrendPoint { index, entry })
        .collect();
}

fn buckets(logs: &[LogEntry]) -> [PerformanceBucket; 4] {
    let mut buckets = BUCKET_BOUNDS.map(|(label, lower, upper)| {
        return PerformanceBucket {
            label,
            lower_bound_ms: lower,
            upper_bound_ms: upper,
            count: 0,
        };
    });

    for entry in logs {
        buckets[bucket_for(entry.exec_time_ms)].count += 1;
    }

    return buckets;
}

fn stats(logs: &[LogEntry]) -> PerformanceStats {
    if logs.is_empty() {
        return PerformanceStats::default();
    }

    let total: f64 = logs.iter().map(|entry| return entry.exec_time_ms).sum();
    let maximum = logs
        .iter()
        .map(|entry| return entry.exec_time_ms)
        .fold(f64::NEG_INFINITY, f64::max);

    return PerformanceStats {
        average: Some(total / logs.len() as f64),
        maximum: Some(maximum),
        slow_count: logs
            .iter()
            .filter(|entry| return entry.exec_time_ms > SLOW_QUERY_MS)
            .count(),
    };
}

/// Turns a query log into a time-ordered trend, the fixed execution-time
/// histogram and summary statistics. Statistics are taken over the logs as
/// given; the trend is the only sorted output.
pub fn aggregate(logs: &[LogEntry]) -> PerformanceReport {
    let report = PerformanceReport {
        trend: trend(logs),
        buckets: buckets(logs),
        stats: stats(logs),
    };

    tracing::debug!(
        entries = logs.len(),
        slow = report.stats.slow_count,
        "Aggregated query log"
    );

    return report;
}
