use clap::Parser;
use file_rotate::{compression::Compression, suffix::AppendCount, ContentLimit, FileRotate};
use log::info;
use std::env;
use std::rc::Rc;

use schedsim::config::SimulationConfig;
use schedsim::metrics::printer::{print_metrics, print_outcomes};
use schedsim::simulator::SchedulingSimulation;
use schedsim::state::{ClusterState, WorkloadBatch};

#[derive(Parser)]
struct Args {
    #[clap(short, long)]
    config_file: std::path::PathBuf,
    #[clap(long)]
    cluster_state_file: std::path::PathBuf,
    #[clap(long)]
    pending_pods_file: std::path::PathBuf,
}

fn main() {
    let args = Args::parse();

    let config_yaml =
        std::fs::read_to_string(&args.config_file).expect("could not read config file");
    let config = Rc::new(serde_yaml::from_str::<SimulationConfig>(&config_yaml).unwrap());

    // log level INFO by default
    let mut env_logger_builder = env_logger::builder();
    if env::var("RUST_LOG").is_err() {
        env_logger_builder.filter_level(log::LevelFilter::Info);
    }
    if let Some(logs_filepath) = &config.logs_filepath {
        let log_writer = FileRotate::new(
            logs_filepath,
            AppendCount::new(3),
            ContentLimit::Lines(1_000_000),
            Compression::None,
            #[cfg(unix)]
            None,
        );
        env_logger_builder.target(env_logger::Target::Pipe(Box::new(log_writer)));
    }
    env_logger_builder.init();

    info!(
        "Path to config file: {:?}",
        args.config_file.canonicalize().unwrap()
    );
    info!(
        "Path to cluster state file: {:?}",
        args.cluster_state_file.canonicalize().unwrap()
    );
    info!(
        "Path to pending pods file: {:?}",
        args.pending_pods_file.canonicalize().unwrap()
    );

    let cluster_state_yaml =
        std::fs::read_to_string(&args.cluster_state_file).expect("could not read cluster state");
    let pending_pods_yaml =
        std::fs::read_to_string(&args.pending_pods_file).expect("could not read pending pods");

    let cluster_state = serde_yaml::from_str::<ClusterState>(&cluster_state_yaml).unwrap();
    let batch = serde_yaml::from_str::<WorkloadBatch>(&pending_pods_yaml).unwrap();

    let mut simulation = SchedulingSimulation::new(config.clone());
    simulation
        .initialize(cluster_state)
        .expect("cluster state is inconsistent");
    let (statuses, overflow_count) = simulation.run(&batch).expect("simulation failed");

    print_outcomes(&statuses);
    info!(
        "Scheduled {} of {} pods, {} controllers overflowed the equivalence cache",
        statuses.iter().filter(|s| s.is_scheduled()).count(),
        batch.pods.len(),
        overflow_count
    );

    if let Some(metrics_printer) = &config.metrics_printer {
        print_metrics(simulation.metrics_collector.clone(), metrics_printer);
    }
}
