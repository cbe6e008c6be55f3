pub fn narrative_fixture() -> &'static str {
    return r#"
Query 7 runs in 412 ms and spends most of its time in a hash join.

Optimizations:
- Filter orders by o_orderdate before the join
- Project only the columns used by the aggregate

Warnings:
- The join spills to disk above 2M rows

Recommendations:
- Create an index on lineitem(l_orderkey)
"#;
}

/// Execution times in milliseconds, covering every bucket and both sides of
/// each edge.
pub fn exec_times_fixture() -> &'static [f64] {
    return &[
        0.4, 3.2, 10.0, 10.01, 27.5, 49.9, 50.0, 61.3, 88.8, 100.0, 100.5, 240.0, 1312.7,
    ];
}
