//! Error types for the validation crate.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for validation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during validation.
#[derive(Debug, Error)]
pub enum Error {
    /// Analytical model failure (derivation, resolution, sweep).
    #[error("analytical model error: {0}")]
    Model(#[from] bandcheck_core::Error),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Netlist could not be written.
    #[error("failed to write netlist {path}: {source}")]
    NetlistWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Simulator executable is missing.
    #[error("simulator not found: {0}")]
    SimulatorNotFound(String),

    /// Simulator ran but reported failure.
    #[error("simulation failed: {0}")]
    SimulationFailed(String),

    /// Simulator did not finish in time.
    #[error("simulation timed out after {0} seconds")]
    SimulationTimeout(u64),

    /// Failed to parse a rawfile.
    #[error("failed to parse rawfile: {0}")]
    RawfileParseError(String),

    /// Rawfile format not supported.
    #[error("unsupported rawfile format: {0}")]
    UnsupportedRawfileFormat(String),

    /// Variable not found in results.
    #[error("variable not found: {0}")]
    VariableNotFound(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
