//! Newline-delimited framing for [`Message`] over a byte stream.
//!
//! A single read may carry several lines, or part of one; the decoder
//! yields one message per complete line in arrival order. Malformed
//! lines are logged and skipped so a confused peer cannot stop the
//! reader. A line that never ends is the one terminal decode error.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{trace, warn};

use crate::error::{GomokuError, ProtocolError};
use crate::message::Message;

/// Longest line accepted, excluding the newline. `MOVE 14 14` is ten
/// bytes; anything near this limit is garbage.
pub const MAX_LINE_LENGTH: usize = 64;

/// Line codec for [`Message`]: one `MOVE x y` or `NEWGAME` per line.
#[derive(Debug, Default)]
pub struct GomokuCodec {
    /// Where to resume the newline search in the read buffer.
    next_index: usize,
    /// Malformed lines dropped so far.
    dropped: u64,
}

impl GomokuCodec {
    /// A codec with an empty line buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one line (without its `\n`). `None` for blank or malformed
    /// lines.
    fn decode_line(&mut self, raw: &[u8]) -> Option<Message> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let parsed = std::str::from_utf8(raw)
            .map_err(|_| ProtocolError::InvalidUtf8)
            .and_then(|line| {
                if line.trim().is_empty() {
                    Err(ProtocolError::Empty)
                } else {
                    line.parse::<Message>()
                }
            });

        match parsed {
            Ok(message) => {
                trace!(%message, "decoded line");
                Some(message)
            }
            Err(ProtocolError::Empty) => None,
            Err(e) => {
                self.dropped += 1;
                warn!(
                    error = %e,
                    line = %String::from_utf8_lossy(raw),
                    dropped = self.dropped,
                    "dropping malformed line"
                );
                None
            }
        }
    }
}

impl Decoder for GomokuCodec {
    type Item = Message;
    type Error = GomokuError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let newline = src[self.next_index..].iter().position(|b| *b == b'\n');

            let Some(offset) = newline else {
                if src.len() > MAX_LINE_LENGTH {
                    return Err(GomokuError::LineTooLong { max: MAX_LINE_LENGTH });
                }
                self.next_index = src.len();
                return Ok(None);
            };

            let end = self.next_index + offset;
            self.next_index = 0;
            if end > MAX_LINE_LENGTH {
                return Err(GomokuError::LineTooLong { max: MAX_LINE_LENGTH });
            }

            let line = src.split_to(end + 1);
            if let Some(message) = self.decode_line(&line[..end]) {
                return Ok(Some(message));
            }
        }
    }

    /// Like `decode`, but a final line without a trailing newline is
    /// still accepted when the peer closes the stream.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(message) = self.decode(src)? {
            return Ok(Some(message));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let rest = src.split_to(src.len());
        self.next_index = 0;
        Ok(self.decode_line(&rest))
    }
}

impl Encoder<Message> for GomokuCodec {
    type Error = GomokuError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = item.to_string();
        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}
