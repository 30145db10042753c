//! Unified error type for the link layer.

use thiserror::Error;

/// Errors surfaced by the link layer.
///
/// Negotiation failures (`ConnectFailed`, `DiscoveryFailed`) are recovered
/// internally by resetting the session and rescanning; they appear here only
/// in logs. The remaining variants are returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// The adapter is powered off or not yet available. Scan and connect
    /// requests are refused until a power-on event arrives.
    #[error("bluetooth adapter is unavailable")]
    HardwareUnavailable,

    /// The connection attempt was rejected or dropped by the radio.
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    /// Service or characteristic discovery failed, or found no match.
    #[error("discovery failed: {0}")]
    DiscoveryFailed(String),

    /// A send was attempted while the data channel was not negotiated.
    /// Caller contract violation; nothing is queued and no write is issued.
    #[error("data channel is not ready")]
    ChannelNotReady,

    /// An inbound notification payload could not be decoded.
    #[error("malformed notification payload")]
    MalformedNotification,

    /// A connect request arrived while a session was already active.
    #[error("a connection session is already active")]
    SessionActive,

    /// The driver task is no longer running.
    #[error("link driver is no longer running")]
    LinkClosed,

    /// Configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}
