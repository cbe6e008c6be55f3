use std::collections::BTreeMap;

use test_utils::narrative_fixture;
use yansi::Paint;

use super::emphasis;
use super::message;
use super::queries;
use super::report;
use super::schema;
use super::sections;
use crate::domain::models::ChatReply;
use crate::domain::models::ColumnInfo;
use crate::domain::models::LogEntry;
use crate::domain::models::Message;
use crate::domain::models::QuerySummary;
use crate::domain::models::TableSchema;
use crate::domain::services::aggregate;
use crate::domain::services::classify;

#[test]
fn it_renders_bold_spans() {
    let bold = Paint::new("Performance Graph Available").bold().to_string();
    assert_eq!(
        emphasis("See **Performance Graph Available** below"),
        format!("See {bold} below")
    );
}

#[test]
fn it_leaves_unmatched_markers() {
    assert_eq!(emphasis("a ** b"), "a ** b");
    assert_eq!(emphasis("no markup"), "no markup");
}

#[test]
fn it_renders_classified_sections() {
    let res = sections(&classify(narrative_fixture()));

    insta::assert_snapshot!(res, @r###"
    Summary
      Query 7 runs in 412 ms and spends most of its time in a hash join.

    Optimizations
      - Filter orders by o_orderdate before the join
      - Project only the columns used by the aggregate

    Warnings
      - The join spills to disk above 2M rows

    Recommendations
      - Create an index on lineitem(l_orderkey)
    "###);
}

#[test]
fn it_renders_unstructured_narrative_raw() {
    let res = sections(&classify("  Looks fine to me.\n"));
    assert_eq!(res, "Looks fine to me.");
}

#[test]
fn it_renders_report() {
    let logs = [5.0, 30.0, 75.0, 150.0]
        .iter()
        .enumerate()
        .map(|(idx, ms)| return LogEntry::new(idx as f64, *ms, "SELECT 1"))
        .collect::<Vec<LogEntry>>();
    let res = report(&aggregate(&logs));

    let expected = [
        "Executions:    4",
        "Average:       65.00 ms",
        "Maximum:       150.00 ms",
        "Slow (>100ms): 1",
        "",
        "0–10ms       1 ####################",
        "10–50ms      1 ####################",
        "50–100ms     1 ####################",
        "100ms+       1 ####################",
    ]
    .join("\n");
    assert_eq!(res, expected);
}

#[test]
fn it_scales_report_bars() {
    let logs = [1.0, 2.0, 3.0, 4.0, 200.0]
        .iter()
        .map(|ms| return LogEntry::new(0.0, *ms, "SELECT 1"))
        .collect::<Vec<LogEntry>>();
    let res = report(&aggregate(&logs));

    assert!(res.contains("0–10ms       4 ####################"));
    assert!(res.contains("10–50ms      0\n"));
    assert!(res.contains("100ms+       1 #####"));
}

#[test]
fn it_guards_empty_report() {
    assert_eq!(report(&aggregate(&[])), "No log data.");
}

#[test]
fn it_renders_queries() {
    let res = queries(&[
        QuerySummary {
            query_id: 3,
            exec_time_ms: 512.0,
            bottleneck_operator: Some("SEQ_SCAN".to_string()),
            recommendation: None,
            has_graph: true,
        },
        QuerySummary {
            query_id: 1,
            exec_time_ms: 4.5,
            bottleneck_operator: None,
            recommendation: None,
            has_graph: false,
        },
    ]);

    insta::assert_snapshot!(res, @r###"
    - (3) 512.00 ms, bottleneck: SEQ_SCAN, graph available
    - (1) 4.50 ms, bottleneck: unknown
    "###);
    assert_eq!(queries(&[]), "No analysed queries yet.");
}

#[test]
fn it_renders_schema() {
    let mut tables = BTreeMap::new();
    tables.insert(
        "orders".to_string(),
        TableSchema {
            columns: vec![
                ColumnInfo {
                    column_name: "o_orderkey".to_string(),
                    column_type: "INTEGER".to_string(),
                },
                ColumnInfo {
                    column_name: "o_orderdate".to_string(),
                    column_type: "DATE".to_string(),
                },
            ],
            sample_values: BTreeMap::new(),
        },
    );

    assert_eq!(schema(&tables), "orders: o_orderkey INTEGER, o_orderdate DATE");
    assert_eq!(schema(&BTreeMap::new()), "No tables found.");
}

#[test]
fn it_renders_message_artifacts() {
    let msg = Message::from_reply(ChatReply {
        text: "Here's the performance graph for Query 7:".to_string(),
        query_id: Some(7),
        query_text: Some("SELECT * FROM orders".to_string()),
        graph_ref: Some("g7".to_string()),
    });
    let res = message(2, &msg);

    assert!(res.starts_with("[2] "));
    assert!(res.contains("Here's the performance graph for Query 7:"));
    assert!(res.contains("\n    Query: SELECT * FROM orders"));
    assert!(res.ends_with("\n    Graph: g7 (/focus 2 to open)"));
}
