use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::mpsc::Sender;
use tokio::time::{self, Duration};
use tracing::{debug, info};

use super::config::SimulatorConfig;
use super::error::Error;
use super::types::{TickMessage, TickStreamer};
use common::error::Error as EngineError;
use common::types::Tick;
use common::weights::split_pair;

/// Range of the initial reference value assigned to each simulated asset.
const INITIAL_VALUE_RANGE: std::ops::Range<f64> = 0.01..10_000.0;

/// Produces synthetic price ticks for the configured pairs.
///
/// Every asset carries a hidden reference value that follows a random walk. Each tick
/// moves the base asset of one random pair and prices that pair as
/// `value(base) / value(quote)`. Pairs that are not re-priced go stale, which is where
/// arbitrage cycles come from.
pub struct SimulatorStreamer {
    symbols: Vec<String>,
    config: SimulatorConfig,
    seed: Option<u64>,
}

impl SimulatorStreamer {
    pub fn new(symbols: Vec<String>, config: SimulatorConfig) -> Self {
        Self {
            symbols,
            config,
            seed: None,
        }
    }

    /// Deterministic stream for tests and reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn pairs(&self) -> Result<Vec<(String, String)>, Error> {
        self.symbols
            .iter()
            .map(|symbol| {
                split_pair(symbol)
                    .map(|(base, quote)| (base.to_string(), quote.to_string()))
                    .ok_or_else(|| Error::GraphError(EngineError::MalformedSymbol(symbol.clone())))
            })
            .collect()
    }
}

#[async_trait]
impl TickStreamer for SimulatorStreamer {
    /// Emits `total_ticks` ticks, one per `interval_ms`, then the stop sentinel.
    ///
    /// Backpressure is handled by awaiting `sender.send()`. Exits with an error if the
    /// receiver is dropped.
    async fn run_stream(self, sender: Sender<TickMessage>) -> Result<(), Error> {
        let pairs = self.pairs()?;

        let mut rng = match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        let assets: BTreeSet<&str> = pairs
            .iter()
            .flat_map(|(base, quote)| [base.as_str(), quote.as_str()])
            .collect();
        let mut values: HashMap<&str, f64> = assets
            .into_iter()
            .map(|asset| (asset, rng.random_range(INITIAL_VALUE_RANGE)))
            .collect();

        let fluctuation = self.config.rate_fluctuation_bps.abs() / 10_000.0;
        let mut interval = time::interval(Duration::from_millis(self.config.interval_ms.max(1)));

        info!(
            pairs = pairs.len(),
            total_ticks = self.config.total_ticks,
            "SimulatorStreamer: Starting"
        );

        for _ in 0..self.config.total_ticks {
            if pairs.is_empty() {
                break;
            }
            interval.tick().await;

            let (base, quote) = &pairs[rng.random_range(0..pairs.len())];
            let step = if fluctuation > 0.0 {
                rng.random_range(-fluctuation..=fluctuation)
            } else {
                0.0
            };

            if let Some(value) = values.get_mut(base.as_str()) {
                *value *= 1.0 + step;
            }
            let price = values[base.as_str()] / values[quote.as_str()];

            let tick = Tick::new(format!("{}-{}", base, quote), price);
            debug!(symbol = %tick.symbol, price, "Simulated tick");

            if sender.send(TickMessage::Tick(tick)).await.is_err() {
                info!("Simulator shutting down: worker receiver dropped.");
                return Err(Error::ChannelSendFailed);
            }
        }

        sender
            .send(TickMessage::Stop)
            .await
            .map_err(|_| Error::ChannelSendFailed)?;

        info!("SimulatorStreamer: Finished");
        Ok(())
    }
}
