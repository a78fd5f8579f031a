//! AMCP client for CasparCG playout servers.
//!
//! One lazily opened TCP connection carries every request. Requests are
//! pipelined: each one is written immediately and queued with the reply shape
//! it expects, and replies are matched to the queue strictly in send order.
//!
//! ```no_run
//! use caspar_client::{CasparClient, ConnectionConfig};
//!
//! # async fn demo() -> Result<(), caspar_client::ClientError> {
//! let client = CasparClient::new(ConnectionConfig::from_env());
//! for name in client.list_clips().await? {
//!     let info = client.clip_info(&name).await?;
//!     println!("{} {:?}", name, info.duration);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::{CasparClient, ReplyShape};
pub use config::ConnectionConfig;
pub use error::ClientError;
pub use types::{ClipInfo, Layer, LayerStatus};
