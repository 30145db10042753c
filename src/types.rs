//! Defines shared data structures for the link layer.

use std::fmt;

use uuid::Uuid;

/// Stable identifier of a peripheral, unique for the duration of a scan
/// session. Opaque; the backend decides its shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Power state of the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
    Unknown,
}

/// A raw advertisement as reported by the radio, before filtering.
#[derive(Debug, Clone)]
pub struct RawAdvertisement<D> {
    /// Identity of the advertising device.
    pub id: DeviceId,
    /// Advertised local name, if the packet carried one.
    pub name: Option<String>,
    /// Signal strength in dBm, if the adapter reported it.
    pub rssi: Option<i16>,
    /// Advertised service UUIDs; may be empty for peripherals that only
    /// advertise their name.
    pub service_ids: Vec<Uuid>,
    /// Backend handle used to initiate a connection.
    pub device: D,
}

/// A discovered candidate peripheral. Immutable once constructed; the
/// registry removes entries but never mutates them in place.
#[derive(Debug, Clone)]
pub struct CandidateDevice<D> {
    pub id: DeviceId,
    pub name: String,
    pub rssi: i16,
    pub service_ids: Vec<Uuid>,
    pub handle: D,
}

impl<D> CandidateDevice<D> {
    /// Handle-free projection published to observers.
    pub fn summary(&self) -> DeviceSummary {
        DeviceSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            rssi: self.rssi,
        }
    }
}

/// Observer-facing view of a candidate device.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DeviceSummary {
    pub id: DeviceId,
    pub name: String,
    pub rssi: i16,
}

/// A characteristic reported by discovery, with the capability flag the
/// negotiation cares about.
#[derive(Debug, Clone)]
pub struct CharacteristicInfo<C> {
    pub uuid: Uuid,
    /// True when the characteristic accepts writes (with or without
    /// response).
    pub can_write: bool,
    pub handle: C,
}
