//! Error types for the chassis abstraction

use thiserror::Error;

/// Errors surfaced by card property reads and writes
#[derive(Debug, Error)]
pub enum CardError {
    /// The card variant does not implement this property
    #[error("property not supported by this card variant: {0}")]
    Unsupported(&'static str),

    /// No card is installed at the addressed slot
    #[error("no card at number {0}")]
    NoSuchCard(u32),

    /// The hardware rejected or failed the write
    #[error("hardware write failed: {0}")]
    WriteFailed(String),
}
