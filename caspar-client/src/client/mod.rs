//! Client module for the AMCP connection.

pub mod connection;
pub mod framer;
pub mod reply;

pub use connection::CasparClient;
pub use framer::ReplyShape;
