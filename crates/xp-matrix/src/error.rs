//! Error types for the matrix engine

use thiserror::Error;
use xp_chassis::{CardError, SignalMask};

/// Errors that can occur while routing
#[derive(Debug, Error)]
pub enum MatrixError {
    /// Route selector could not be coerced to a card number
    #[error("invalid route selector '{0}'")]
    BadSelector(String),

    /// Request addresses a slot outside the chassis' addressable range
    #[error("route out of range: input {input} to output {output} ({signal})")]
    OutOfRange {
        /// Requested input number
        input: u32,
        /// Requested output number
        output: u32,
        /// Requested signal planes
        signal: SignalMask,
    },

    /// A port with this key is already registered
    #[error("duplicate port key '{0}'")]
    DuplicatePortKey(String),

    /// Hardware property access failed
    #[error("card error: {0}")]
    Card(#[from] CardError),
}
