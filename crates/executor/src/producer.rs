use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tracing::info;

use super::{
    error::Error,
    types::{TickMessage, TickStreamer},
};

/// Owns a tick source and runs it as its own task, decoupled from the worker.
pub struct Producer<S: TickStreamer> {
    streamer: S,
}

impl<S> Producer<S>
where
    S: TickStreamer,
{
    pub fn new(streamer: S) -> Self {
        Producer { streamer }
    }

    pub fn spawn(self, sender: Sender<TickMessage>) -> JoinHandle<Result<(), Error>> {
        info!("Producer ready.");
        tokio::spawn(async move { self.streamer.run_stream(sender).await })
    }
}
