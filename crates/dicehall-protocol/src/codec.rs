//! Codec trait and the JSON implementation.
//!
//! The gateway holds a codec and never calls `serde_json` directly, so
//! the frame format can change without touching connection handling.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Frame format shared by every connection task.
pub trait Codec: Send + Sync + 'static {
    /// One event in, one frame out.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// One frame in, one event out. Frames that are empty, malformed, or
    /// name an unknown event are errors.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] producing UTF-8 JSON, one event per frame.
///
/// JSON is what the browser client speaks natively and what shows up
/// readable in DevTools.
///
/// ```rust
/// use dicehall_protocol::{ClientEvent, Codec, JsonCodec, RoomCode};
///
/// let codec = JsonCodec;
/// let event: ClientEvent =
///     codec.decode(br#"{"event":"joinRoom","data":"482913"}"#).unwrap();
/// assert_eq!(event, ClientEvent::JoinRoom(RoomCode::from("482913")));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Err(ProtocolError::InvalidMessage("empty frame".into()));
        }
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
