//! Channel payload decoding.
//! The peripheral pushes its state over the negotiated characteristic; the
//! first byte carries a boolean flag.

use crate::error::LinkError;

/// Decodes an inbound notification payload.
///
/// The first byte is the flag; zero is off, anything else is on. Trailing
/// bytes are ignored. An empty payload is malformed.
pub fn decode_state_flag(payload: &[u8]) -> Result<bool, LinkError> {
    match payload.first() {
        Some(&byte) => Ok(byte != 0),
        None => Err(LinkError::MalformedNotification),
    }
}
