pub mod config;
pub mod csv_streamer;
pub mod error;
pub mod logging;
pub mod producer;
pub mod sim_streamer;
pub mod types;
pub mod worker;

use std::env;
use std::path::PathBuf;
use tokio::sync::{mpsc, mpsc::Sender};
use tokio::task::JoinHandle;
use tracing::{error, info};

use arb_engine_core::Engine;
use csv_streamer::CsvStreamer;
use error::Error;
use producer::Producer;
use sim_streamer::SimulatorStreamer;
use types::{DataSource, TickMessage};
use worker::{Worker, WorkerSummary};

const USAGE: &str = "Usage: executor <sim|csv> [path_to_csv] [--config <path>]
  - sim: run a simulated tick stream over the configured pairs
  - csv: replay a recorded trade log (timestamp, symbol, price, quantity)";

#[derive(Debug, PartialEq)]
struct Args {
    source: DataSource,
    config_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = env::args().collect::<Vec<_>>();
    let args = parse_args(&args).inspect_err(|_| eprintln!("{}", USAGE))?;

    let config_path = match args.config_path {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let config = config::load_config(&config_path)?;
    logging::init(&config.logging);

    let engine = Engine::with_tolerance(&config.engine.symbols, config.engine.tolerance)?;
    info!(
        assets = ?engine.assets(),
        pairs = config.engine.symbols.len(),
        "Engine constructed"
    );

    let (sender, receiver) = mpsc::channel::<TickMessage>(config.pipeline.buffer_size);

    // Spawn tasks
    let producer_handle = spawn_producer(&args.source, sender, &config);
    let worker_handle = Worker::new(engine, receiver).spawn_task();

    join_pipeline(producer_handle, worker_handle).await?;
    Ok(())
}

/// Waits for both tasks. The worker summary is logged first; a producer failure (unreadable
/// feed, unparsable row) is then returned even though the worker itself shut down cleanly.
async fn join_pipeline(
    producer_handle: JoinHandle<Result<(), Error>>,
    worker_handle: JoinHandle<Result<WorkerSummary, Error>>,
) -> Result<WorkerSummary, Error> {
    let (producer_result, worker_result) = tokio::join!(producer_handle, worker_handle);

    let producer_result = producer_result?;
    if let Err(e) = &producer_result {
        error!(error = %e, "Producer failed");
    }

    let summary = worker_result??;
    info!(
        applied = summary.ticks_applied,
        dropped = summary.ticks_dropped,
        opportunities = summary.opportunities_found,
        "Pipeline shut down."
    );

    producer_result?;
    Ok(summary)
}

/// Parse command-line arguments to determine the data source and config file.
fn parse_args(args: &[String]) -> Result<Args, Error> {
    let mut positional = Vec::new();
    let mut config_path = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let path = iter
                .next()
                .ok_or_else(|| Error::Usage("--config requires a path".to_string()))?;
            config_path = Some(PathBuf::from(path));
        } else {
            positional.push(arg.as_str());
        }
    }

    let source = positional
        .first()
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "sim".to_string());

    let source = match source.as_str() {
        "sim" => DataSource::Sim,
        "csv" => {
            let path = positional
                .get(1)
                .ok_or_else(|| Error::Usage("CSV path required for CSV mode".to_string()))?;
            DataSource::Csv(path.to_string())
        }
        other => return Err(Error::Usage(format!("Unknown data source '{}'", other))),
    };

    Ok(Args {
        source,
        config_path,
    })
}

pub fn spawn_producer(
    source: &DataSource,
    sender: Sender<TickMessage>,
    config: &config::Config,
) -> JoinHandle<Result<(), Error>> {
    match source {
        DataSource::Sim => {
            info!("Starting SimulatorStreamer producer task...");
            let streamer =
                SimulatorStreamer::new(config.engine.symbols.clone(), config.simulator.clone());
            Producer::new(streamer).spawn(sender)
        }
        DataSource::Csv(path) => {
            info!(path = %path, "Starting CsvStreamer producer task...");
            let streamer = CsvStreamer::new(path.clone());
            Producer::new(streamer).spawn(sender)
        }
    }
}
