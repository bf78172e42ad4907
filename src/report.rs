use crate::{
    config::RunConfig,
    lifecycle::Timings,
    scoring::{find_threshold, Rating},
};
use anyhow::Context;
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use std::{collections::BTreeMap, fs, path::Path};
use term_table::{row, row::Row, rows, table_cell::*, Table, TableStyle};

pub const OPERATION_METRICS: &[(&str, &str)] = &[
    ("vm_create", "VM create"),
    ("volume_create", "Volume create"),
    ("snapshot_create", "Snapshot create"),
    ("clone_operation", "Clone"),
    ("volume_resize", "Volume resize"),
    ("snapshot_delete", "Snapshot delete"),
];

pub const IO_METRICS: &[(&str, &str, &str)] = &[
    ("seq_write_mbps", "Sequential write", "MB/s"),
    ("seq_read_mbps", "Sequential read", "MB/s"),
    ("rand_read_iops", "Random read", "IOPS"),
    ("rand_write_iops", "Random write", "IOPS"),
];

fn rating_cell(metric: &str, value: f64) -> TableCell {
    match find_threshold(metric) {
        Some(threshold) => TableCell::new(threshold.classify(value).colorized()),
        None => TableCell::new("--".bright_black()),
    }
}

/// Prints the scored result tables. The storage-operation table is always
/// printed; the I/O table only when at least one I/O measurement exists.
pub fn render_summary(timings: &Timings) {
    println!("\n{}", " Storage Operations ".reversed().green());

    let mut op_rows = vec![row![
        TableCell::builder("Operation".bold()).build(),
        TableCell::builder("Time (s)".bold()).build(),
        TableCell::builder("Rating".bold()).build()
    ]];
    for (metric, label) in OPERATION_METRICS {
        if let Some(value) = timings.get(metric) {
            op_rows.push(row![
                TableCell::new(label),
                TableCell::new(format!("{:.2}", value)),
                rating_cell(metric, value)
            ]);
        }
    }

    let table = Table::builder()
        .rows(op_rows)
        .style(TableStyle::rounded())
        .build();
    println!("{}", table.render());

    let io_rows = IO_METRICS
        .iter()
        .filter_map(|(metric, label, unit)| {
            timings.get(metric).map(|value| {
                row![
                    TableCell::new(label),
                    TableCell::new(format!("{:.1} {}", value, unit)),
                    rating_cell(metric, value)
                ]
            })
        })
        .collect::<Vec<_>>();

    if !io_rows.is_empty() {
        println!("{}", " I/O Performance ".reversed().green());

        let header = rows![row![
            TableCell::builder("Test".bold()).build(),
            TableCell::builder("Result".bold()).build(),
            TableCell::builder("Rating".bold()).build()
        ]];
        let table = Table::builder()
            .rows(header.into_iter().chain(io_rows).collect::<Vec<_>>())
            .style(TableStyle::rounded())
            .build();
        println!("{}", table.render());
    }
}

#[derive(Debug, Serialize)]
pub struct BenchmarkInfo {
    pub storage: String,
    pub node: String,
    pub test_size: String,
    pub test_size_bytes: u64,
    pub timestamp: String,
    pub io_tests_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub benchmark: BenchmarkInfo,
    pub operations: BTreeMap<&'static str, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_performance: Option<BTreeMap<&'static str, f64>>,
}

pub fn build_report(config: &RunConfig, timings: &Timings) -> Report {
    let operations = OPERATION_METRICS
        .iter()
        .filter_map(|(metric, _)| timings.get(metric).map(|value| (*metric, value)))
        .collect::<BTreeMap<_, _>>();

    let io_performance = IO_METRICS
        .iter()
        .filter_map(|(metric, _, _)| timings.get(metric).map(|value| (*metric, value)))
        .collect::<BTreeMap<_, _>>();

    Report {
        benchmark: BenchmarkInfo {
            storage: config.storage.clone(),
            node: config.node.clone(),
            test_size: config.test_size.clone(),
            test_size_bytes: config.test_size_bytes,
            timestamp: Utc::now().to_rfc3339(),
            io_tests_enabled: config.io_tests,
        },
        operations,
        io_performance: if io_performance.is_empty() {
            None
        } else {
            Some(io_performance)
        },
    }
}

pub fn write_report(config: &RunConfig, timings: &Timings, path: &Path) -> anyhow::Result<()> {
    let report = build_report(config, timings);
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(path, json).context(format!("Failed to write report to {}", path.display()))?;
    Ok(())
}
