//! Typed error hierarchy for knbn-web.
//!
//! Two top-level enums cover the two subsystems:
//! - `DiscoveryError`: path sandboxing and board search
//! - `BoardError`: loading a single board file

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the board-discovery subsystem.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Access denied: Path outside working directory ({})", .path.display())]
    AccessDenied { path: PathBuf },

    #[error("Directory not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Discovery task panicked: {0}")]
    WorkerPanicked(String),
}

/// Errors from loading a board file.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Board file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid board path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("Failed to parse board {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to read board {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}
