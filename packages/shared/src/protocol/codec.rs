//! Length-delimited codec turning byte streams into [`Message`]s and back.

use bytes::{Bytes, BytesMut};
use serde::Serialize;
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use super::{
    envelope::Envelope,
    error::ProtocolError,
    message::{Message, MessageKind},
};

/// Largest accepted frame payload (1 MiB).
pub const MAX_FRAME_LENGTH: usize = 1024 * 1024;

/// Borrowed twin of [`Envelope`], serialized only to measure a payload.
#[derive(Serialize)]
struct EnvelopeRef<'a> {
    kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
}

/// Whether a `kind` message carrying `body` encodes into a single frame.
///
/// JSON escaping makes the payload longer than the body, so the check runs
/// on the serialized form rather than on `body.len()`.
pub fn fits_in_frame(kind: MessageKind, body: Option<&str>) -> bool {
    serde_json::to_vec(&EnvelopeRef { kind, body })
        .is_ok_and(|payload| payload.len() <= MAX_FRAME_LENGTH)
}

/// Codec for one relaychat connection.
///
/// Frames are a 4-byte big-endian length followed by a JSON [`Envelope`].
/// Exactly one [`Message`] is produced per complete frame; a partially
/// received frame yields `Ok(None)` until the rest arrives.
///
/// # Example
///
/// ```ignore
/// let mut framed = Framed::new(stream, MessageCodec::new());
/// framed.send(Message::Entry("hello".to_string())).await?;
/// ```
#[derive(Debug)]
pub struct MessageCodec {
    frames: LengthDelimitedCodec,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self {
            frames: LengthDelimitedCodec::builder()
                .max_frame_length(MAX_FRAME_LENGTH)
                .new_codec(),
        }
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let frame = match self.frames.decode(src) {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(None),
            // LengthDelimitedCodec reports oversized frames as InvalidData
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                return Err(ProtocolError::CorruptMessage(e.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let envelope: Envelope = serde_json::from_slice(&frame)
            .map_err(|e| ProtocolError::CorruptMessage(e.to_string()))?;
        Message::try_from(envelope).map(Some)
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = serde_json::to_vec(&Envelope::from(item))
            .map_err(|e| ProtocolError::CorruptMessage(e.to_string()))?;
        self.frames.encode(Bytes::from(payload), dst)?;
        Ok(())
    }
}
