use super::config::ConfigError;
use crate::core::io::TrajectoryError;
use crate::core::models::cell::CellError;
use crate::core::selection::SelectionError;
use std::path::PathBuf;
use thiserror::Error;

/// Broad failure categories. Every one of them aborts the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid options or selection, raised before any frame is processed.
    Configuration,
    /// The output destination can not be written.
    Io,
    /// The trajectory source failed to produce a frame.
    UpstreamRead,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid selection: {0}")]
    Selection(#[from] SelectionError),

    #[error("Invalid unit cell: {0}")]
    Cell(#[from] CellError),

    #[error("Could not write to '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read trajectory: {0}")]
    Read(#[from] TrajectoryError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Config(_) | EngineError::Selection(_) | EngineError::Cell(_) => {
                ErrorKind::Configuration
            }
            EngineError::Io { .. } => ErrorKind::Io,
            EngineError::Read(_) => ErrorKind::UpstreamRead,
        }
    }
}
