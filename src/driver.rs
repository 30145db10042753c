//! Link driver.
//! The single serialized execution context of the crate: one task consumes
//! presentation commands and radio events, applies them to the session, and
//! executes the resulting effects against the radio. Session and registry
//! are mutated nowhere else.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::channel::decode_state_flag;
use crate::config::LinkConfig;
use crate::error::LinkError;
use crate::filter::AdvertisementFilter;
use crate::hub::NotificationHub;
use crate::radio::{Radio, RadioEvent};
use crate::registry::DeviceRegistry;
use crate::session::{Effect, LinkState, Session};
use crate::types::{DeviceId, RawAdvertisement};

/// Commands issued by the presentation layer, routed into the driver task.
#[derive(Debug, Clone)]
pub enum Command {
    Scan,
    Connect(DeviceId),
    Disconnect,
    Send(Vec<u8>),
}

/// Presentation-facing command surface.
///
/// Cheap to clone; all commands are enqueued into the driver's serialized
/// context rather than mutating state directly.
#[derive(Debug, Clone)]
pub struct LinkHandle {
    commands: mpsc::UnboundedSender<Command>,
    link_state: watch::Receiver<LinkState>,
}

impl LinkHandle {
    /// Starts a fresh scan pass.
    pub fn request_scan(&self) -> Result<(), LinkError> {
        self.send(Command::Scan)
    }

    /// Connects to a previously scanned candidate.
    pub fn request_connect(&self, id: DeviceId) -> Result<(), LinkError> {
        self.send(Command::Connect(id))
    }

    /// Tears down the active session, if any.
    pub fn request_disconnect(&self) -> Result<(), LinkError> {
        self.send(Command::Disconnect)
    }

    /// Submits a payload over the negotiated channel.
    ///
    /// Fails synchronously with [`LinkError::ChannelNotReady`] unless the
    /// link is ready; nothing is queued. The driver re-checks readiness when
    /// the command is dequeued, so a payload that loses a race with a state
    /// change is dropped rather than written.
    pub fn request_send(&self, payload: impl Into<Vec<u8>>) -> Result<(), LinkError> {
        if *self.link_state.borrow() != LinkState::Ready {
            return Err(LinkError::ChannelNotReady);
        }
        self.send(Command::Send(payload.into()))
    }

    fn send(&self, command: Command) -> Result<(), LinkError> {
        self.commands.send(command).map_err(|_| LinkError::LinkClosed)
    }
}

/// One unit of work for the serialized loop.
enum Input<R: Radio> {
    Command(Command),
    Event(RadioEvent<R>),
}

/// Owns the session, registry, filter, and hub, and runs the event loop.
pub struct LinkDriver<R: Radio> {
    radio: Arc<R>,
    config: LinkConfig,
    filter: AdvertisementFilter,
    registry: DeviceRegistry<R::Device>,
    session: Session<R>,
    hub: NotificationHub,
    commands: mpsc::UnboundedReceiver<Command>,
    events_tx: mpsc::UnboundedSender<RadioEvent<R>>,
    events_rx: mpsc::UnboundedReceiver<RadioEvent<R>>,
    /// Stops the advertisement pump of the current scan pass.
    scan_cancel: CancellationToken,
    /// Stops the link-scoped pumps (notifications, disconnect watch).
    link_cancel: CancellationToken,
}

impl<R: Radio> LinkDriver<R> {
    pub fn new(radio: R, config: LinkConfig) -> (Self, LinkHandle) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let hub = NotificationHub::new();
        let handle = LinkHandle {
            commands: commands_tx,
            link_state: hub.link_state(),
        };
        let driver = Self {
            radio: Arc::new(radio),
            filter: AdvertisementFilter::new(&config),
            registry: DeviceRegistry::new(),
            session: Session::new(config.clone()),
            config,
            hub,
            commands: commands_rx,
            events_tx,
            events_rx,
            scan_cancel: CancellationToken::new(),
            link_cancel: CancellationToken::new(),
        };
        (driver, handle)
    }

    /// The observable streams. Subscribe before spawning [`run`](Self::run).
    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    /// Runs the event loop until every [`LinkHandle`] is dropped.
    pub async fn run(mut self) {
        info!("Link driver started");
        self.radio.watch_power(self.events_tx.clone()).await;

        loop {
            let input = tokio::select! {
                command = self.commands.recv() => command.map(Input::Command),
                event = self.events_rx.recv() => event.map(Input::Event),
            };
            let Some(input) = input else {
                break;
            };
            let effects = match input {
                Input::Command(command) => {
                    debug!("Command: {:?}", command);
                    self.on_command(command)
                }
                Input::Event(event) => {
                    debug!("Radio event: {}", event.kind());
                    self.session.radio_event(event)
                }
            };
            for effect in effects {
                self.apply(effect).await;
            }
            self.hub.publish_link_state(self.session.state());
        }

        // Stop outstanding radio tasks before the driver goes away.
        self.scan_cancel.cancel();
        self.link_cancel.cancel();
        info!("Link driver stopped");
    }

    fn on_command(&mut self, command: Command) -> Vec<Effect<R>> {
        match command {
            Command::Scan => match self.session.request_scan() {
                Ok(effects) => effects,
                Err(e) => {
                    warn!("Scan request refused: {e}");
                    Vec::new()
                }
            },
            Command::Connect(id) => {
                let Some(candidate) = self.registry.get(&id) else {
                    warn!("Connect requested for unknown device {id}");
                    return Vec::new();
                };
                match self.session.request_connect(candidate) {
                    Ok(effects) => effects,
                    Err(e) => {
                        warn!("Connect request refused: {e}");
                        Vec::new()
                    }
                }
            }
            Command::Disconnect => self.session.request_disconnect(),
            Command::Send(payload) => match self.session.request_send(payload) {
                Ok(effects) => effects,
                // The handle's readiness check lost a race with a state
                // change; the payload is dropped, nothing reaches the radio.
                Err(e) => {
                    warn!("Send refused: {e}");
                    Vec::new()
                }
            },
        }
    }

    async fn apply(&mut self, effect: Effect<R>) {
        debug!("Effect: {}", effect.kind());
        match effect {
            Effect::ClearDevices => {
                self.registry.reset();
                self.hub.publish_device_list(Vec::new());
            }
            Effect::StartScan => {
                self.scan_cancel = CancellationToken::new();
                self.radio
                    .scan(self.events_tx.clone(), self.scan_cancel.clone())
                    .await;
            }
            Effect::StopScan => self.scan_cancel.cancel(),
            Effect::RegisterCandidate(adv) => self.register_candidate(adv),
            Effect::Connect(device) => {
                self.link_cancel = CancellationToken::new();
                self.radio.connect(device, self.events_tx.clone()).await;
            }
            Effect::WatchDisconnect(device) => {
                self.radio
                    .watch_disconnect(device, self.events_tx.clone(), self.link_cancel.clone())
                    .await;
            }
            Effect::DiscoverServices(device) => {
                self.radio
                    .discover_services(device, self.config.service_uuid, self.events_tx.clone())
                    .await;
            }
            Effect::DiscoverCharacteristics(service) => {
                self.radio
                    .discover_characteristics(
                        service,
                        self.config.characteristic_uuid,
                        self.events_tx.clone(),
                    )
                    .await;
            }
            Effect::Subscribe(channel) => {
                self.radio
                    .subscribe(channel, self.events_tx.clone(), self.link_cancel.clone())
                    .await;
            }
            Effect::Write { channel, payload } => {
                self.radio.write(channel, payload, self.events_tx.clone()).await;
            }
            Effect::Disconnect(device) => {
                self.radio.disconnect(device, self.events_tx.clone()).await;
            }
            Effect::TeardownLink => self.link_cancel.cancel(),
            Effect::PublishInbound(payload) => match decode_state_flag(&payload) {
                Ok(flag) => {
                    debug!("Peripheral state flag: {flag}");
                    self.hub.publish_inbound_flag(flag);
                }
                Err(e) => warn!("Dropping inbound payload of {} bytes: {e}", payload.len()),
            },
        }
    }

    fn register_candidate(&mut self, adv: RawAdvertisement<R::Device>) {
        let Some(candidate) = self.filter.accept(adv) else {
            return;
        };
        info!(
            "Found candidate device: {} ({}, {} dBm)",
            candidate.name, candidate.id, candidate.rssi
        );
        if self.registry.upsert(candidate) {
            self.hub.publish_device_list(self.registry.summaries());
        }
    }
}
