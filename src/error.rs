// src/error.rs
//! Error types for loading pose data, configuration and exporting results.
//!
//! The geometry kernel itself never returns these: missing landmarks and
//! degenerate vectors come back as `None`.

use thiserror::Error;

use crate::selection::Edge;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Pose data or configuration was not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing a CSV export failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An edge argument could not be parsed as two landmark indices
    #[error("Invalid edge: {0}")]
    InvalidEdge(String),

    /// The two edges do not share exactly one joint
    #[error("Edges {edge_a} and {edge_b} do not share exactly one joint")]
    InvalidSelection { edge_a: Edge, edge_b: Edge },

    /// Unknown anatomical plane name
    #[error("Invalid plane: {0}")]
    InvalidPlane(String),

    /// Requested frame does not exist in the loaded sequence
    #[error("Frame {index} out of range (sequence has {len} frames)")]
    FrameOutOfRange { index: usize, len: usize },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
