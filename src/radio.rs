//! Radio boundary.
//! The underlying radio stack is an external collaborator. It is reached
//! through the [`Radio`] trait and reports back through the closed
//! [`RadioEvent`] set, so the state machine consumes a fixed event enum
//! instead of open-ended callbacks.

use std::fmt::Debug;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::types::{CharacteristicInfo, PowerState, RawAdvertisement};

/// Opaque handle types of a radio backend.
pub trait RadioTypes: Send + Sync + 'static {
    type Device: Clone + Debug + Send + Sync + 'static;
    type Service: Clone + Debug + Send + Sync + 'static;
    type Characteristic: Clone + Debug + Send + Sync + 'static;
}

/// Channel on which a radio backend delivers its events.
pub type EventSender<R> = mpsc::UnboundedSender<RadioEvent<R>>;

/// Asynchronous events delivered by the radio stack.
///
/// Each request on [`Radio`] returns immediately; its outcome arrives later
/// as one of these variants. The driver feeds them, one at a time, into the
/// session's transition function.
pub enum RadioEvent<R: RadioTypes> {
    PowerChanged(PowerState),
    Advertisement(RawAdvertisement<R::Device>),
    Connected,
    ConnectFailed { reason: String },
    ServicesDiscovered(Vec<R::Service>),
    ServiceDiscoveryFailed { reason: String },
    CharacteristicsDiscovered(Vec<CharacteristicInfo<R::Characteristic>>),
    CharacteristicDiscoveryFailed { reason: String },
    Disconnected,
    InboundData(Vec<u8>),
    WriteFailed { reason: String },
}

impl<R: RadioTypes> RadioEvent<R> {
    /// Variant name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PowerChanged(_) => "PowerChanged",
            Self::Advertisement(_) => "Advertisement",
            Self::Connected => "Connected",
            Self::ConnectFailed { .. } => "ConnectFailed",
            Self::ServicesDiscovered(_) => "ServicesDiscovered",
            Self::ServiceDiscoveryFailed { .. } => "ServiceDiscoveryFailed",
            Self::CharacteristicsDiscovered(_) => "CharacteristicsDiscovered",
            Self::CharacteristicDiscoveryFailed { .. } => "CharacteristicDiscoveryFailed",
            Self::Disconnected => "Disconnected",
            Self::InboundData(_) => "InboundData",
            Self::WriteFailed { .. } => "WriteFailed",
        }
    }
}

/// Capability set assumed of the radio stack.
///
/// Every method is fire-and-forget: implementations spawn the actual
/// operation and deliver the outcome through `events`. Long-lived streams
/// (scan, notifications, disconnect watch) run until their token is
/// cancelled. Implementations must deliver events serially per operation;
/// the driver serializes consumption.
#[async_trait]
pub trait Radio: RadioTypes + Sized {
    /// Report the adapter's power state, now and on later changes, as
    /// [`RadioEvent::PowerChanged`].
    async fn watch_power(&self, events: EventSender<Self>);

    /// Stream advertisements as [`RadioEvent::Advertisement`] until
    /// cancelled.
    async fn scan(&self, events: EventSender<Self>, cancel: CancellationToken);

    /// Initiate a connection; outcome arrives as [`RadioEvent::Connected`]
    /// or [`RadioEvent::ConnectFailed`].
    async fn connect(&self, device: Self::Device, events: EventSender<Self>);

    /// Watch an established link for unsolicited loss, reported as
    /// [`RadioEvent::Disconnected`].
    async fn watch_disconnect(
        &self,
        device: Self::Device,
        events: EventSender<Self>,
        cancel: CancellationToken,
    );

    /// Tear the link down; confirmation arrives as
    /// [`RadioEvent::Disconnected`].
    async fn disconnect(&self, device: Self::Device, events: EventSender<Self>);

    /// Discover services matching `service` only.
    async fn discover_services(&self, device: Self::Device, service: Uuid, events: EventSender<Self>);

    /// Discover characteristics matching `characteristic` within `service`.
    async fn discover_characteristics(
        &self,
        service: Self::Service,
        characteristic: Uuid,
        events: EventSender<Self>,
    );

    /// Write `payload` to the channel, requesting delivery acknowledgment.
    /// Only failures are reported (as [`RadioEvent::WriteFailed`]).
    async fn write(&self, channel: Self::Characteristic, payload: Vec<u8>, events: EventSender<Self>);

    /// Subscribe to notifications on the channel, streamed as
    /// [`RadioEvent::InboundData`] until cancelled.
    async fn subscribe(
        &self,
        channel: Self::Characteristic,
        events: EventSender<Self>,
        cancel: CancellationToken,
    );
}
