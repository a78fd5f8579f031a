//! Framing, parsing and encoding for the deck line protocol.
//!
//! Record format:
//! ```text
//! play: clip id: 2 speed: 100\r\n
//! ```
//! Bare `\n` terminators are accepted as well.

use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::types::{RawCommand, Reply};

/// Line terminator used for every reply line.
pub const CRLF: &str = "\r\n";

/// Commands whose name spans two words.
pub const TWO_WORD_COMMANDS: [&str; 5] = [
    "device info",
    "slot info",
    "transport info",
    "clips count",
    "clips get",
];

/// Extract the next non-blank record from the buffer.
///
/// A trailing `\r` is stripped from each record. Whitespace-only records are
/// consumed and skipped. Bytes after the last `\n` stay in the buffer until
/// more input arrives.
pub fn next_line(buf: &mut BytesMut) -> Option<String> {
    loop {
        let pos = buf.iter().position(|&b| b == b'\n')?;
        let mut line = buf.split_to(pos + 1);
        line.truncate(pos);
        if line.last() == Some(&b'\r') {
            line.truncate(pos - 1);
        }

        let line = String::from_utf8_lossy(&line).into_owned();
        if !line.trim().is_empty() {
            return Some(line);
        }
    }
}

/// Parse one record into a command name and its parameters.
///
/// Parameter names run up to a token ending in `:`, and the single token
/// after it is the value. Tokens after the last `name:` pair are ignored.
pub fn parse_command(raw: &str) -> Result<RawCommand, ProtocolError> {
    let trimmed = raw.trim();
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(ProtocolError::EmptyCommand);
    }

    let lower = trimmed.to_lowercase();
    let (name, mut i) = match TWO_WORD_COMMANDS.iter().find(|c| lower.starts_with(*c)) {
        Some(c) => (c.to_string(), 2),
        None => {
            let first = tokens[0];
            (first.strip_suffix(':').unwrap_or(first).to_lowercase(), 1)
        }
    };

    let mut params = BTreeMap::new();
    while i < tokens.len() {
        let mut name_parts = Vec::new();
        while i < tokens.len() && !tokens[i].ends_with(':') {
            name_parts.push(tokens[i]);
            i += 1;
        }
        if i >= tokens.len() {
            break;
        }

        let last = tokens[i];
        name_parts.push(&last[..last.len() - 1]);
        i += 1;

        if i >= tokens.len() {
            break;
        }
        let value = tokens[i];
        i += 1;

        params.insert(name_parts.join(" ").to_lowercase(), value.to_string());
    }

    Ok(RawCommand { name, params })
}

/// Encode a reply into its wire form.
pub fn encode_reply(reply: &Reply) -> Bytes {
    let mut out = BytesMut::new();
    match reply {
        Reply::Ok => put_line(&mut out, "200 ok"),
        Reply::Unsupported => put_line(&mut out, "103 unsupported"),
        Reply::RemoteDisabled => put_line(&mut out, "111 remote control disabled"),
        Reply::Block { code, text, lines } => {
            put_line(&mut out, &format!("{} {}:", code, text));
            for line in lines {
                put_line(&mut out, line);
            }
            out.put_slice(CRLF.as_bytes());
        }
    }
    out.freeze()
}

fn put_line(out: &mut BytesMut, line: &str) {
    out.put_slice(line.as_bytes());
    out.put_slice(CRLF.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_line_crlf_and_lf() {
        let mut buf = BytesMut::from(&b"ping\r\nstop\ntransport info\r\n"[..]);
        assert_eq!(next_line(&mut buf).as_deref(), Some("ping"));
        assert_eq!(next_line(&mut buf).as_deref(), Some("stop"));
        assert_eq!(next_line(&mut buf).as_deref(), Some("transport info"));
        assert_eq!(next_line(&mut buf), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_next_line_keeps_partial_fragment() {
        let mut buf = BytesMut::from(&b"play: clip id: 1\r\ngo"[..]);
        assert_eq!(next_line(&mut buf).as_deref(), Some("play: clip id: 1"));
        assert_eq!(next_line(&mut buf), None);
        assert_eq!(&buf[..], b"go");

        buf.extend_from_slice(b"to: clip id: 2\r");
        assert_eq!(next_line(&mut buf), None);
        buf.extend_from_slice(b"\n");
        assert_eq!(next_line(&mut buf).as_deref(), Some("goto: clip id: 2"));
    }

    #[test]
    fn test_next_line_skips_blank_lines() {
        let mut buf = BytesMut::from(&b"\r\n   \r\n\nping\r\n"[..]);
        assert_eq!(next_line(&mut buf).as_deref(), Some("ping"));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_parse_two_word_command_with_params() {
        let cmd = parse_command("clips get: clip id: 2 count: 3").unwrap();
        assert_eq!(cmd.name, "clips get");
        assert_eq!(cmd.params.len(), 2);
        assert_eq!(cmd.params["clip id"], "2");
        assert_eq!(cmd.params["count"], "3");
    }

    #[test]
    fn test_parse_single_word_strips_colon() {
        let cmd = parse_command("  Play: Speed: 50  ").unwrap();
        assert_eq!(cmd.name, "play");
        assert_eq!(cmd.params["speed"], "50");

        let cmd = parse_command("goto:").unwrap();
        assert_eq!(cmd.name, "goto");
        assert!(cmd.params.is_empty());
    }

    #[test]
    fn test_parse_two_word_is_prefix_match() {
        let cmd = parse_command("Transport Info").unwrap();
        assert_eq!(cmd.name, "transport info");
        assert!(cmd.params.is_empty());

        // "disk list" is not a two-word command; "list" is a dangling token.
        let cmd = parse_command("disk list").unwrap();
        assert_eq!(cmd.name, "disk");
        assert!(cmd.params.is_empty());
    }

    #[test]
    fn test_parse_duplicate_and_trailing_tokens() {
        let cmd = parse_command("notify: slot: true slot: false dangling words").unwrap();
        assert_eq!(cmd.params.len(), 1);
        assert_eq!(cmd.params["slot"], "false");

        let cmd = parse_command("play: speed:").unwrap();
        assert!(cmd.params.is_empty());
    }

    #[test]
    fn test_parse_keeps_raw_value_case() {
        let cmd = parse_command("REMOTE: ENABLE: True").unwrap();
        assert_eq!(cmd.name, "remote");
        assert_eq!(cmd.params["enable"], "True");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_command(""), Err(ProtocolError::EmptyCommand));
        assert_eq!(parse_command(" \t "), Err(ProtocolError::EmptyCommand));
    }

    #[test]
    fn test_encode_single_line_replies() {
        assert_eq!(&encode_reply(&Reply::Ok)[..], b"200 ok\r\n");
        assert_eq!(&encode_reply(&Reply::Unsupported)[..], b"103 unsupported\r\n");
        assert_eq!(
            &encode_reply(&Reply::RemoteDisabled)[..],
            b"111 remote control disabled\r\n"
        );
    }

    #[test]
    fn test_encode_block() {
        let reply = Reply::block(
            214,
            "clips count",
            vec!["clip count: 4".to_string()],
        );
        assert_eq!(
            &encode_reply(&reply)[..],
            b"214 clips count:\r\nclip count: 4\r\n\r\n"
        );
    }
}
