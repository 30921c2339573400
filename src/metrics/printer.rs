use prettytable::{row, Table};
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, fs::File, io::Write, rc::Rc};

use crate::core::scheduling::hinting_simulator::{ScheduleStatus, ScheduleVerdict};
use crate::metrics::collector::MetricsCollector;

#[derive(Debug, Default, Deserialize, PartialEq)]
pub enum OutputFormat {
    #[default]
    JSON,
    PrettyTable,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct MetricsPrinterConfig {
    format: OutputFormat,
    output_file: std::path::PathBuf,
}

/// Prints one row per processed pod to stdout.
pub fn print_outcomes(statuses: &[ScheduleStatus]) {
    let mut table = Table::new();
    table.add_row(row!["Pod", "Outcome", "Details"]);
    for status in statuses {
        match &status.verdict {
            ScheduleVerdict::Scheduled { node_name } => {
                table.add_row(row![status.pod_name, "scheduled", node_name]);
            }
            ScheduleVerdict::Unschedulable { reasons } => {
                table.add_row(row![status.pod_name, "unschedulable", reasons.join("; ")]);
            }
        }
    }
    table.printstd();
}

pub fn print_metrics(collector: Rc<RefCell<MetricsCollector>>, config: &MetricsPrinterConfig) {
    match config.format {
        OutputFormat::PrettyTable => print_metrics_as_pretty_table(collector, &config.output_file),
        OutputFormat::JSON => print_metrics_as_json(collector, &config.output_file),
    }
}

pub fn print_metrics_as_pretty_table(
    collector: Rc<RefCell<MetricsCollector>>,
    output_file: &std::path::PathBuf,
) {
    let metrics = collector.borrow();
    let mut metrics_file = File::create(output_file).unwrap();

    let mut aggregated_table = Table::new();
    aggregated_table.add_row(row!["Metric", "Count"]);
    aggregated_table.add_row(row!["Total nodes", metrics.total_nodes]);
    aggregated_table.add_row(row!["Total pending pods", metrics.total_pending_pods]);
    aggregated_table.add_row(row!["Pods processed", metrics.pods_processed]);
    aggregated_table.add_row(row!["Pods scheduled", metrics.pods_scheduled]);
    aggregated_table.add_row(row!["Pods unschedulable", metrics.pods_unschedulable]);
    aggregated_table.add_row(row!["Hint hits", metrics.hint_hits]);
    aggregated_table.add_row(row!["Equivalence cache hits", metrics.equivalence_cache_hits]);
    aggregated_table.add_row(row![
        "Overflowing controllers",
        metrics.overflowing_controllers
    ]);
    aggregated_table.add_row(row![
        "Predicate checks total",
        metrics.predicate_checks_total
    ]);

    let mut stats_table = Table::new();
    stats_table.add_row(row!["Metric", "Min", "Max", "Mean", "Variance"]);
    stats_table.add_row(row![
        "Predicate checks per pod",
        metrics.predicate_checks_per_pod_stats.min(),
        metrics.predicate_checks_per_pod_stats.max(),
        metrics.predicate_checks_per_pod_stats.mean(),
        metrics
            .predicate_checks_per_pod_stats
            .population_variance()
    ]);

    let _ = aggregated_table.print(&mut metrics_file);
    let _ = stats_table.print(&mut metrics_file);
}

#[derive(Serialize)]
struct MetricsJSON {
    counters: Counters,
    stats: Stats,
}

#[derive(Serialize)]
struct Counters {
    total_nodes: u64,
    total_pending_pods: u64,
    pods_processed: u64,
    pods_scheduled: u64,
    pods_unschedulable: u64,
    hint_hits: u64,
    equivalence_cache_hits: u64,
    overflowing_controllers: u64,
    predicate_checks_total: u64,
}

#[derive(Serialize)]
struct Stats {
    predicate_checks_per_pod: StatsValues,
}

#[derive(Serialize)]
struct StatsValues {
    min: f64,
    max: f64,
    mean: f64,
    variance: f64,
}

pub fn print_metrics_as_json(
    collector: Rc<RefCell<MetricsCollector>>,
    output_file: &std::path::PathBuf,
) {
    let metrics = collector.borrow();
    let mut metrics_file = File::create(output_file).unwrap();

    let metrics = MetricsJSON {
        counters: Counters {
            total_nodes: metrics.total_nodes,
            total_pending_pods: metrics.total_pending_pods,
            pods_processed: metrics.pods_processed,
            pods_scheduled: metrics.pods_scheduled,
            pods_unschedulable: metrics.pods_unschedulable,
            hint_hits: metrics.hint_hits,
            equivalence_cache_hits: metrics.equivalence_cache_hits,
            overflowing_controllers: metrics.overflowing_controllers,
            predicate_checks_total: metrics.predicate_checks_total,
        },
        stats: Stats {
            predicate_checks_per_pod: StatsValues {
                min: metrics.predicate_checks_per_pod_stats.min(),
                max: metrics.predicate_checks_per_pod_stats.max(),
                mean: metrics.predicate_checks_per_pod_stats.mean(),
                variance: metrics
                    .predicate_checks_per_pod_stats
                    .population_variance(),
            },
        },
    };

    let serialized_json = serde_json::to_string_pretty(&metrics).unwrap();
    metrics_file.write_all(serialized_json.as_bytes()).unwrap();
}
