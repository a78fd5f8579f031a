//! Error types for the deck protocol.

use thiserror::Error;

/// Protocol-level errors that can occur while reading controller records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The record held no tokens.
    #[error("Empty command line")]
    EmptyCommand,
}
