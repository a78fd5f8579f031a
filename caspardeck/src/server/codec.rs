//! `tokio_util` codec for the controller connection.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use hyperdeck_protocol::{encode_reply, next_line, Reply};

/// Decodes non-blank records, encodes [`Reply`] values.
#[derive(Debug, Default)]
pub struct DeckCodec;

impl Decoder for DeckCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        Ok(next_line(src))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        if let Some(line) = next_line(src) {
            return Ok(Some(line));
        }
        // An unterminated tail is not a record.
        src.clear();
        Ok(None)
    }
}

impl Encoder<Reply> for DeckCodec {
    type Error = std::io::Error;

    fn encode(&mut self, reply: Reply, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&encode_reply(&reply));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_partial_record() {
        let mut codec = DeckCodec;
        let mut buf = BytesMut::from(&b"ping\r\ntransport in"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("ping"));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"fo\r\n\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("transport info"));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_eof_drops_tail() {
        let mut codec = DeckCodec;
        let mut buf = BytesMut::from(&b"stop\nplay"[..]);
        assert_eq!(codec.decode_eof(&mut buf).unwrap().as_deref(), Some("stop"));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_encode() {
        let mut codec = DeckCodec;
        let mut buf = BytesMut::new();
        codec.encode(Reply::RemoteDisabled, &mut buf).unwrap();
        codec.encode(Reply::Ok, &mut buf).unwrap();
        assert_eq!(&buf[..], b"111 remote control disabled\r\n200 ok\r\n");
    }
}
