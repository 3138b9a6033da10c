/// Errors raised while turning frames into events or events into frames.
///
/// A `ProtocolError` always means the bytes were the problem, never the
/// room: a malformed frame from one client is dropped without touching
/// any game state.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[cfg(feature = "json")]
    #[error("cannot encode event: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown event name,
    /// or a payload of the wrong shape.
    #[cfg(feature = "json")]
    #[error("cannot decode frame: {0}")]
    Decode(serde_json::Error),

    /// The frame carries nothing that could be an event.
    #[error("invalid frame: {0}")]
    InvalidMessage(String),
}
