use tokio::sync::mpsc::Sender;

use super::error::Error;
use common::types::Tick;

/// Message carried from the ingestion side to the worker.
///
/// `Stop` is the end-of-stream sentinel; it is never interpreted as a price.
#[derive(Debug, Clone, PartialEq)]
pub enum TickMessage {
    Tick(Tick),
    Stop,
}

/// A trait defining the contract for any source that generates and streams ticks
/// into the worker.
///
/// Decouples the producer task from the concrete source (CSV trade log vs. simulated
/// market). Implementations finish by sending `TickMessage::Stop`.
///
/// The trait bounds (`Send`, `Sync`, `'static`) are required so the implementation can be
/// moved onto the multi-threaded Tokio runtime.
#[async_trait::async_trait]
pub trait TickStreamer: Send + Sync + 'static {
    async fn run_stream(self, sender: Sender<TickMessage>) -> Result<(), Error>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Sim,
    Csv(String),
}
