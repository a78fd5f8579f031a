//! Controller-facing server.

pub mod codec;
pub mod dispatcher;
pub mod listener;
pub mod session;
pub mod state;

pub use dispatcher::Dispatcher;
pub use listener::{Server, ServerConfig};
