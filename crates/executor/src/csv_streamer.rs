use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::fs::File;
use tokio::sync::mpsc::Sender;
use tracing::{error, info};

use super::error::Error;
use super::types::{TickMessage, TickStreamer};
use common::types::Tick;

// One row of the recorded trade log: `timestamp, symbol, price, quantity`.
#[derive(Debug, Deserialize)]
pub struct CsvRecord {
    #[allow(dead_code)]
    pub timestamp: String,

    pub symbol: String,

    pub price: f64,

    #[serde(default)]
    #[allow(dead_code)]
    pub quantity: Option<f64>,
}

/// Replays a recorded trade log as a tick stream, then sends the stop sentinel.
pub struct CsvStreamer {
    path: String,
}

impl CsvStreamer {
    pub fn new(path: String) -> Self {
        CsvStreamer { path }
    }

    fn parse_csv_to_ticks(&self) -> Result<Vec<Tick>, Error> {
        let file = File::open(&self.path).map_err(|e| {
            error!(path = %self.path, error = %e, "Failed to read trade log");
            Error::IoError(e)
        })?;

        // The recorder writes a space after every comma.
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(file);

        let mut ticks = Vec::new();

        for result in rdr.deserialize() {
            let record: CsvRecord = result?;
            ticks.push(Tick::new(record.symbol, record.price));
        }
        Ok(ticks)
    }
}

#[async_trait::async_trait]
impl TickStreamer for CsvStreamer {
    async fn run_stream(self, sender: Sender<TickMessage>) -> Result<(), Error> {
        let ticks = self.parse_csv_to_ticks()?;
        let total_ticks = ticks.len();

        info!(total_ticks, path = %self.path, "CsvStreamer: Starting replay");

        for tick in ticks {
            if let Err(e) = sender.send(TickMessage::Tick(tick)).await {
                error!(error = %e, "CsvStreamer shutting down: worker receiver dropped");
                return Err(Error::ChannelSendFailed);
            }
        }

        sender
            .send(TickMessage::Stop)
            .await
            .map_err(|_| Error::ChannelSendFailed)?;

        info!(total_ticks, "CsvStreamer: Replay complete");
        Ok(())
    }
}
