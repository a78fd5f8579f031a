//! Error types for the AMCP client.

use thiserror::Error;

/// Client-side errors that can occur while talking to the playout server.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The connection could not be established.
    #[error("Connection failed: {0}")]
    Connect(#[source] std::io::Error),

    /// The socket failed while this request was the oldest one in flight.
    #[error("Socket error: {0}")]
    Io(String),

    /// The connection went away before a reply was framed.
    #[error("Connection closed")]
    ConnectionClosed,
}
