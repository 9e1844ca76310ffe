use thiserror::Error;

use common::error::Error as EngineError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Channel sender failed: Receiver has been dropped.")]
    ChannelSendFailed,

    #[error("Graph processing error: {0}")]
    GraphError(#[from] EngineError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Failed to load configuration: {0}")]
    ConfigLoadError(String),

    #[error("Pipeline task failed: {0}")]
    TaskJoinError(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Usage(String),
}
