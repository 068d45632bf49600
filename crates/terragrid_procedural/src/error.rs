//! # Generation Error Types
//!
//! Every way a generation request can be refused.
//!
//! All of these are detected before a pass starts writing into a new grid,
//! so a refused request never disturbs the previously generated world.

use thiserror::Error;

/// Errors that can occur while configuring or running a generation pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// A draw was requested from a weight table whose total is not positive.
    #[error("invalid weights: total weight {total} cannot be drawn from")]
    InvalidWeights {
        /// The table total.
        total: f64,
    },

    /// A strategy was configured without any catalog entries.
    #[error("empty catalog: strategy {strategy} has no entries to select from")]
    EmptyCatalog {
        /// Name of the strategy that was refused.
        strategy: &'static str,
    },

    /// One of the grid dimensions is zero.
    #[error("invalid dimensions: {width}x{height}x{depth}")]
    InvalidDimensions {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
        /// Requested depth.
        depth: usize,
    },

    /// Paced emission was requested with a reveal time or rate that is not positive.
    #[error("invalid pacing rate {rate} (reveal over {reveal_seconds}s)")]
    InvalidPacingRate {
        /// Configured reveal duration.
        reveal_seconds: f64,
        /// Computed emission rate.
        rate: f64,
    },

    /// A draw outside `[0, total]` was handed to a weight table.
    #[error("draw {draw} outside of [0, {total}]")]
    DrawOutOfRange {
        /// The draw value.
        draw: f64,
        /// The table's total weight.
        total: f64,
    },

    /// Malformed world description or an out-of-domain parameter.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for generation operations.
pub type GenerationResult<T> = Result<T, GenerationError>;
