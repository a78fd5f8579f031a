//! Reply framing for AMCP.
//!
//! AMCP replies carry no request identifier, so the caller has to know which
//! shape the next reply will take:
//!
//! ```text
//! Single:  202 PLAY OK\r\n
//! Two:     201 CINF OK\r\n"AMB" MOVIE 6445960 20170413141655 268 1/25\r\n
//! Multi:   200 CLS OK\r\n<line>\r\n...<line>\r\n\r\n
//! ```

use bytes::{Buf, BytesMut};

/// Expected shape of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    /// One line.
    Single,
    /// Exactly two lines.
    Two,
    /// Any number of lines closed by a blank line.
    Multi,
}

/// Take one reply of the given shape off the front of the buffer.
///
/// Returns `None` and leaves the buffer untouched until a complete reply is
/// available.
///
/// - `Single` returns the line without its terminator.
/// - `Two` returns both lines including their terminators.
/// - `Multi` returns everything before the blank line; the blank line and the
///   terminators around it are discarded.
pub fn extract(buf: &mut BytesMut, shape: ReplyShape) -> Option<String> {
    match shape {
        ReplyShape::Single => {
            let pos = buf.iter().position(|&b| b == b'\n')?;
            let line = buf.split_to(pos + 1);
            let mut end = pos;
            if end > 0 && line[end - 1] == b'\r' {
                end -= 1;
            }
            Some(String::from_utf8_lossy(&line[..end]).into_owned())
        }
        ReplyShape::Two => {
            let first = buf.iter().position(|&b| b == b'\n')?;
            let second = buf[first + 1..].iter().position(|&b| b == b'\n')? + first + 1;
            let lines = buf.split_to(second + 1);
            Some(String::from_utf8_lossy(&lines).into_owned())
        }
        ReplyShape::Multi => {
            let (start, end) = find_blank_line(buf)?;
            let block = buf.split_to(start);
            buf.advance(end - start);
            Some(String::from_utf8_lossy(&block).into_owned())
        }
    }
}

/// Locate the first `\r?\n\r?\n` run, as `(start, end)` byte offsets.
fn find_blank_line(buf: &[u8]) -> Option<(usize, usize)> {
    for i in 0..buf.len() {
        if buf[i] != b'\n' {
            continue;
        }
        let start = if i > 0 && buf[i - 1] == b'\r' { i - 1 } else { i };
        match buf.get(i + 1) {
            Some(b'\n') => return Some((start, i + 2)),
            Some(b'\r') if buf.get(i + 2) == Some(&b'\n') => return Some((start, i + 3)),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLS_REPLY: &[u8] =
        b"200 CLS OK\r\n\"AMB\" MOVIE 6445960 20170413141655 268 1/25\r\n\"GO1080P25\" MOVIE 16694084 20170413141655 445 1/25\r\n\r\n";

    #[test]
    fn test_single() {
        let mut buf = BytesMut::from(&b"202 PLAY OK\r\n202 STOP OK\n"[..]);
        assert_eq!(extract(&mut buf, ReplyShape::Single).as_deref(), Some("202 PLAY OK"));
        assert_eq!(extract(&mut buf, ReplyShape::Single).as_deref(), Some("202 STOP OK"));
        assert!(buf.is_empty());
        assert_eq!(extract(&mut buf, ReplyShape::Single), None);
    }

    #[test]
    fn test_two_waits_for_second_line() {
        let mut buf = BytesMut::from(&b"201 CINF OK\r\n\"AMB\" MOVIE"[..]);
        assert_eq!(extract(&mut buf, ReplyShape::Two), None);
        assert_eq!(buf.len(), 24);

        buf.extend_from_slice(b" 6445960 20170413141655 268 1/25\r\n202 PLAY OK\r\n");
        assert_eq!(
            extract(&mut buf, ReplyShape::Two).as_deref(),
            Some("201 CINF OK\r\n\"AMB\" MOVIE 6445960 20170413141655 268 1/25\r\n")
        );
        assert_eq!(&buf[..], b"202 PLAY OK\r\n");
    }

    #[test]
    fn test_multi_discards_blank_line() {
        let mut buf = BytesMut::from(CLS_REPLY);
        buf.extend_from_slice(b"202 PLAY OK\r\n");
        let block = extract(&mut buf, ReplyShape::Multi).unwrap();
        assert!(block.starts_with("200 CLS OK\r\n"));
        assert!(block.ends_with("1/25"));
        assert_eq!(&buf[..], b"202 PLAY OK\r\n");
    }

    #[test]
    fn test_multi_bare_lf() {
        let mut buf = BytesMut::from(&b"200 CLS OK\nA\n\nrest"[..]);
        assert_eq!(extract(&mut buf, ReplyShape::Multi).as_deref(), Some("200 CLS OK\nA"));
        assert_eq!(&buf[..], b"rest");
    }

    #[test]
    fn test_multi_reassembles_at_every_split_point() {
        let whole = {
            let mut buf = BytesMut::from(CLS_REPLY);
            extract(&mut buf, ReplyShape::Multi).unwrap()
        };

        for split in 0..CLS_REPLY.len() {
            let mut buf = BytesMut::new();
            buf.extend_from_slice(&CLS_REPLY[..split]);
            let early = extract(&mut buf, ReplyShape::Multi);
            assert_eq!(early, None, "framed too early at split {}", split);

            buf.extend_from_slice(&CLS_REPLY[split..]);
            assert_eq!(extract(&mut buf, ReplyShape::Multi).as_deref(), Some(whole.as_str()));
            assert!(buf.is_empty(), "leftover bytes at split {}", split);
        }
    }

    #[test]
    fn test_multi_empty_listing() {
        let mut buf = BytesMut::from(&b"200 CLS OK\r\n\r\n"[..]);
        assert_eq!(extract(&mut buf, ReplyShape::Multi).as_deref(), Some("200 CLS OK"));
        assert!(buf.is_empty());
    }
}
