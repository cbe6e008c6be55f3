#[cfg(test)]
#[path = "render_test.rs"]
mod tests;

use std::collections::BTreeMap;

use yansi::Paint;

use crate::domain::models::AnalysisSections;
use crate::domain::models::Message;
use crate::domain::models::PerformanceReport;
use crate::domain::models::QuerySummary;
use crate::domain::models::Role;
use crate::domain::models::TableSchema;

const BAR_WIDTH: usize = 20;

/// Renders `**bold**` spans. An unmatched marker is printed as typed.
pub fn emphasis(text: &str) -> String {
    let parts = text.split("**").collect::<Vec<&str>>();
    let mut balanced_len = parts.len();
    if balanced_len % 2 == 0 {
        balanced_len -= 1;
    }

    return parts
        .iter()
        .enumerate()
        .map(|(idx, part)| {
            if idx % 2 == 0 {
                return part.to_string();
            }
            if idx >= balanced_len {
                return format!("**{part}");
            }
            return Paint::new(*part).bold().to_string();
        })
        .collect::<String>();
}

pub fn sections(sections: &AnalysisSections) -> String {
    if !sections.is_structured() {
        return sections.summary.trim().to_string();
    }

    let mut blocks: Vec<String> = vec![];
    if !sections.summary.is_empty() {
        blocks.push(format!("Summary\n  {}", sections.summary));
    }

    for (title, items) in [
        ("Optimizations", &sections.optimizations),
        ("Warnings", &sections.warnings),
        ("Recommendations", &sections.recommendations),
    ] {
        if items.is_empty() {
            continue;
        }

        let lines = items
            .iter()
            .map(|item| return format!("  - {item}"))
            .collect::<Vec<String>>()
            .join("\n");
        blocks.push(format!("{title}\n{lines}"));
    }

    return blocks.join("\n\n");
}

pub fn report(report: &PerformanceReport) -> String {
    let (average, maximum) = match (report.stats.average, report.stats.maximum) {
        (Some(average), Some(maximum)) => (average, maximum),
        _ => return "No log data.".to_string(),
    };

    let mut lines = vec![
        format!("Executions:    {}", report.trend.len()),
        format!("Average:       {average:.2} ms"),
        format!("Maximum:       {maximum:.2} ms"),
        format!("Slow (>100ms): {}", report.stats.slow_count),
        "".to_string(),
    ];

    let max_count = report
        .buckets
        .iter()
        .map(|bucket| return bucket.count)
        .max()
        .unwrap_or(0);

    for bucket in &report.buckets {
        let mut bar = 0;
        if max_count > 0 {
            bar = bucket.count * BAR_WIDTH / max_count;
        }

        let line = format!("{:<9} {:>4} {}", bucket.label, bucket.count, "#".repeat(bar));
        lines.push(line.trim_end().to_string());
    }

    return lines.join("\n");
}

pub fn queries(queries: &[QuerySummary]) -> String {
    if queries.is_empty() {
        return "No analysed queries yet.".to_string();
    }

    return queries
        .iter()
        .map(|query| {
            let bottleneck = query.bottleneck_operator.as_deref().unwrap_or("unknown");
            let mut line = format!(
                "- ({}) {:.2} ms, bottleneck: {bottleneck}",
                query.query_id, query.exec_time_ms
            );
            if query.has_graph {
                line += ", graph available";
            }

            return line;
        })
        .collect::<Vec<String>>()
        .join("\n");
}

pub fn schema(schema: &BTreeMap<String, TableSchema>) -> String {
    if schema.is_empty() {
        return "No tables found.".to_string();
    }

    return schema
        .iter()
        .map(|(table, table_schema)| {
            let columns = table_schema
                .columns
                .iter()
                .map(|column| return format!("{} {}", column.column_name, column.column_type))
                .collect::<Vec<String>>()
                .join(", ");

            return format!("{table}: {columns}");
        })
        .collect::<Vec<String>>()
        .join("\n");
}

/// One chat turn as printed in the REPL, numbered so `/focus N` can refer to
/// it.
pub fn message(number: usize, message: &Message) -> String {
    let author = match message.role {
        Role::User => Paint::cyan(message.role.to_string()).bold(),
        Role::Assistant => Paint::green(message.role.to_string()).bold(),
    };

    let mut lines = vec![format!("[{number}] {author}: {}", emphasis(&message.text))];

    if let Some(query_text) = &message.query_text {
        lines.push(format!("    Query: {query_text}"));
    }

    if let Some(graph_ref) = message.graph_ref() {
        lines.push(format!(
            "    Graph: {graph_ref} (/focus {number} to open)"
        ));
    }

    return lines.join("\n");
}
