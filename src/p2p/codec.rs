//! Newline-delimited JSON framing codec.
//!
//! Each frame is one JSON envelope terminated by `\n`. Lines that do not
//! parse into a [`Message`] are skipped inside the decoder so a bad frame
//! never ends the stream. A line longer than the configured maximum is an
//! error and closes the connection.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};
use tracing::debug;

use crate::p2p::{Message, P2pError, P2pResult};

/// Codec for newline-framed messages.
#[derive(Debug)]
pub struct MessageCodec {
    lines: LinesCodec,
    max_message_size: usize,
}

impl MessageCodec {
    /// Create a codec accepting frames of at most `max_message_size` bytes.
    pub fn new(max_message_size: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_message_size),
            max_message_size,
        }
    }

    fn next_message(&mut self, src: &mut BytesMut, eof: bool) -> P2pResult<Option<Message>> {
        loop {
            let line = if eof {
                self.lines.decode_eof(src)
            } else {
                self.lines.decode(src)
            };

            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(None),
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    return Err(P2pError::MessageTooLarge {
                        max: self.max_message_size,
                    })
                }
                // Decoding never touches the socket; this is invalid UTF-8
                Err(LinesCodecError::Io(e)) => {
                    debug!(error = %e, "Dropping non UTF-8 frame");
                    continue;
                }
            };

            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            match Message::from_json(text) {
                Ok(message) => return Ok(Some(message)),
                Err(e) => debug!(error = %e, "Dropping malformed message"),
            }
        }
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = P2pError;

    fn decode(&mut self, src: &mut BytesMut) -> P2pResult<Option<Self::Item>> {
        self.next_message(src, false)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> P2pResult<Option<Self::Item>> {
        self.next_message(src, true)
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = P2pError;

    fn encode(&mut self, message: Message, dst: &mut BytesMut) -> P2pResult<()> {
        let line = message.to_json()?;
        if line.len() > self.max_message_size {
            return Err(P2pError::MessageTooLarge {
                max: self.max_message_size,
            });
        }

        self.lines.encode(line, dst).map_err(|e| match e {
            LinesCodecError::MaxLineLengthExceeded => P2pError::MessageTooLarge {
                max: self.max_message_size,
            },
            LinesCodecError::Io(e) => P2pError::Io(e),
        })
    }
}
