//! Line protocol definitions for the caspardeck HyperDeck emulator.
//!
//! This crate defines the text protocol spoken between a studio automation
//! controller and the emulated deck: record framing, command parsing, typed
//! commands, reply encoding and timecode arithmetic.
//!
//! # Record Format
//!
//! ```text
//! <command>[:] [<param name>: <value>]... \r\n
//! ```
//!
//! Replies are either a single status line (`200 ok`) or a block:
//!
//! ```text
//! <code> <text>:\r\n
//! <name>: <value>\r\n
//! ...
//! \r\n
//! ```
//!
//! # Example
//!
//! ```rust
//! use hyperdeck_protocol::{parse_command, Command, Reply, encode_reply};
//!
//! let raw = parse_command("clips get: clip id: 2 count: 3").unwrap();
//! assert_eq!(raw.name, "clips get");
//! assert_eq!(raw.params.get("clip id").map(String::as_str), Some("2"));
//!
//! match Command::from(raw) {
//!     Command::ClipsGet(p) => assert_eq!((p.start, p.count), (2, Some(3))),
//!     other => panic!("unexpected {:?}", other),
//! }
//!
//! assert_eq!(&encode_reply(&Reply::Ok)[..], b"200 ok\r\n");
//! ```

pub mod codec;
pub mod error;
pub mod timecode;
pub mod types;

pub use codec::{encode_reply, next_line, parse_command, CRLF, TWO_WORD_COMMANDS};
pub use error::ProtocolError;
pub use timecode::{frames_to_timecode, guess_video_format, seconds_to_timecode, Timecode};
pub use types::{
    ClipsGetParams, Command, NotifyUpdate, PlayParams, RawCommand, RemoteUpdate, Reply,
    DEFAULT_PORT, PROTOCOL_VERSION,
};
