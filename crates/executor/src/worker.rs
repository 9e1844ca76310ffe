use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::error::Error;
use super::types::TickMessage;
use arb_engine_core::Engine;
use common::types::ArbitrageCycle;

/// Counters reported by the worker when the stream ends.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WorkerSummary {
    pub ticks_applied: usize,
    pub ticks_dropped: usize,
    pub opportunities_found: usize,
    pub last_opportunity: Option<ArbitrageCycle>,
}

/// Single consumer that exclusively owns the engine.
///
/// All graph mutation and all cycle queries happen on this task, so the engine needs no
/// locking. The only suspension point is the channel receive.
pub struct Worker {
    engine: Engine,
    receiver: Receiver<TickMessage>,
}

impl Worker {
    pub fn new(engine: Engine, receiver: Receiver<TickMessage>) -> Self {
        Self { engine, receiver }
    }

    /// Run the worker until the stop sentinel arrives or every sender is gone.
    ///
    /// Each applied tick is followed by an opportunity query. Unknown assets and invalid
    /// prices are dropped; a malformed symbol ends the loop with an error.
    pub async fn process_ticks(mut self) -> Result<WorkerSummary, Error> {
        info!(assets = self.engine.num_vertices(), "Worker ready.");

        let mut summary = WorkerSummary::default();

        loop {
            let tick = match self.receiver.recv().await {
                Some(TickMessage::Tick(tick)) => tick,
                Some(TickMessage::Stop) => {
                    info!("Stop received, shutting down worker.");
                    break;
                }
                None => {
                    warn!("Tick channel closed without a stop message, shutting down worker.");
                    break;
                }
            };

            match self.engine.apply_tick(&tick.symbol, tick.price) {
                Ok(()) => summary.ticks_applied += 1,
                Err(e) if e.is_fatal() => {
                    error!(symbol = %tick.symbol, error = %e, "Fatal tick, stopping worker");
                    return Err(e.into());
                }
                Err(_) => {
                    summary.ticks_dropped += 1;
                    continue;
                }
            }

            if let Some(cycle) = self.engine.find_opportunity()? {
                info!(
                    route = %cycle.route(),
                    legs = cycle.len(),
                    product_rate = cycle.product_rate(),
                    "Arbitrage opportunity found"
                );
                summary.opportunities_found += 1;
                summary.last_opportunity = Some(cycle);
            }
        }

        info!(
            applied = summary.ticks_applied,
            dropped = summary.ticks_dropped,
            opportunities = summary.opportunities_found,
            "Worker finished"
        );
        Ok(summary)
    }

    /// Spawns the worker onto the Tokio runtime and returns its handle.
    pub fn spawn_task(self) -> JoinHandle<Result<WorkerSummary, Error>> {
        tokio::spawn(self.process_ticks())
    }
}
