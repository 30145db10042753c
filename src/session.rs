//! Connection state machine.
//! Drives a single peripheral through scan, connect, scoped service and
//! characteristic discovery, ready, and teardown. Hardware callbacks arrive
//! as [`RadioEvent`]s through one transition function; user actions arrive as
//! explicit request methods. Every transition returns the list of [`Effect`]s
//! the driver must execute, so the machine itself performs no I/O.

use log::{debug, info, warn};

use crate::config::LinkConfig;
use crate::error::LinkError;
use crate::radio::{RadioEvent, RadioTypes};
use crate::types::{CandidateDevice, CharacteristicInfo, DeviceId, PowerState, RawAdvertisement};

/// States of the link lifecycle.
///
/// `Errored` is transient: every terminal negotiation failure passes through
/// it during cleanup and settles in `Idle`, immediately re-entering
/// `Scanning` while the adapter is powered. The machine favors retrying
/// discovery over surfacing a persistent error state; there is no retry
/// backoff or count limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Scanning,
    Connecting,
    DiscoveringServices,
    DiscoveringCharacteristics,
    Ready,
    Disconnecting,
    Errored,
}

impl LinkState {
    /// True for states in which a connection session exists.
    fn has_session(self) -> bool {
        matches!(
            self,
            Self::Connecting
                | Self::DiscoveringServices
                | Self::DiscoveringCharacteristics
                | Self::Ready
                | Self::Disconnecting
        )
    }
}

/// Instructions emitted by a transition, executed by the driver.
#[derive(Debug)]
pub enum Effect<R: RadioTypes> {
    /// Reset the device registry and publish the empty list.
    ClearDevices,
    StartScan,
    StopScan,
    /// Run the advertisement through the filter and, on acceptance, into the
    /// registry.
    RegisterCandidate(RawAdvertisement<R::Device>),
    Connect(R::Device),
    /// Start watching the established link for unsolicited loss.
    WatchDisconnect(R::Device),
    DiscoverServices(R::Device),
    DiscoverCharacteristics(R::Service),
    Subscribe(R::Characteristic),
    Write {
        channel: R::Characteristic,
        payload: Vec<u8>,
    },
    Disconnect(R::Device),
    /// Cancel the link-scoped radio tasks (notification pump, disconnect
    /// watcher).
    TeardownLink,
    /// Decode the inbound payload and publish the flag.
    PublishInbound(Vec<u8>),
}

impl<R: RadioTypes> Effect<R> {
    /// Variant name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClearDevices => "ClearDevices",
            Self::StartScan => "StartScan",
            Self::StopScan => "StopScan",
            Self::RegisterCandidate(_) => "RegisterCandidate",
            Self::Connect(_) => "Connect",
            Self::WatchDisconnect(_) => "WatchDisconnect",
            Self::DiscoverServices(_) => "DiscoverServices",
            Self::DiscoverCharacteristics(_) => "DiscoverCharacteristics",
            Self::Subscribe(_) => "Subscribe",
            Self::Write { .. } => "Write",
            Self::Disconnect(_) => "Disconnect",
            Self::TeardownLink => "TeardownLink",
            Self::PublishInbound(_) => "PublishInbound",
        }
    }
}

struct Target<R: RadioTypes> {
    id: DeviceId,
    device: R::Device,
}

/// The single connection session and its state machine.
///
/// At most one session exists at a time. The session is created by a connect
/// request, advanced exclusively by radio events, and destroyed by disconnect
/// or by an unrecoverable negotiation error. The negotiated channel handle is
/// present if and only if the state is [`LinkState::Ready`].
pub struct Session<R: RadioTypes> {
    config: LinkConfig,
    state: LinkState,
    powered: bool,
    target: Option<Target<R>>,
    channel: Option<R::Characteristic>,
    /// Characteristic discoveries still outstanding, one per service that
    /// matched the target service UUID.
    pending_discoveries: usize,
}

impl<R: RadioTypes> Session<R> {
    pub fn new(config: LinkConfig) -> Self {
        Self {
            config,
            state: LinkState::Idle,
            powered: false,
            target: None,
            channel: None,
            pending_discoveries: 0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// The negotiated channel handle; `Some` iff the state is `Ready`.
    pub fn channel(&self) -> Option<&R::Characteristic> {
        self.channel.as_ref()
    }

    /// Identity of the session's target device, while a session exists.
    pub fn target_id(&self) -> Option<&DeviceId> {
        self.target.as_ref().map(|t| &t.id)
    }

    /// The transition function for hardware callbacks.
    pub fn radio_event(&mut self, event: RadioEvent<R>) -> Vec<Effect<R>> {
        match event {
            RadioEvent::PowerChanged(power) => self.on_power_changed(power),
            RadioEvent::Advertisement(adv) => self.on_advertisement(adv),
            RadioEvent::Connected => self.on_connected(),
            RadioEvent::ConnectFailed { reason } => self.on_connect_failed(reason),
            RadioEvent::ServicesDiscovered(services) => self.on_services_discovered(services),
            RadioEvent::ServiceDiscoveryFailed { reason } => self.on_discovery_failed(reason),
            RadioEvent::CharacteristicsDiscovered(chars) => self.on_characteristics_discovered(chars),
            RadioEvent::CharacteristicDiscoveryFailed { reason } => {
                self.on_characteristic_discovery_failed(reason)
            }
            RadioEvent::Disconnected => self.on_disconnected(),
            RadioEvent::InboundData(payload) => self.on_inbound_data(payload),
            RadioEvent::WriteFailed { reason } => {
                warn!("Write was not acknowledged: {reason}");
                Vec::new()
            }
        }
    }

    /// Starts a fresh scan pass. Rejected while a session is active or the
    /// adapter is unpowered.
    pub fn request_scan(&mut self) -> Result<Vec<Effect<R>>, LinkError> {
        if !self.powered {
            return Err(LinkError::HardwareUnavailable);
        }
        match self.state {
            LinkState::Idle => Ok(self.enter_scanning()),
            LinkState::Scanning => {
                let mut effects = vec![Effect::StopScan];
                effects.extend(self.enter_scanning());
                Ok(effects)
            }
            _ => Err(LinkError::SessionActive),
        }
    }

    /// Begins connecting to a scanned candidate. At most one session may be
    /// active; a second connect request is rejected.
    pub fn request_connect(
        &mut self,
        candidate: &CandidateDevice<R::Device>,
    ) -> Result<Vec<Effect<R>>, LinkError> {
        if !self.powered {
            return Err(LinkError::HardwareUnavailable);
        }
        match self.state {
            LinkState::Scanning => {
                info!("Connecting to {} ({})", candidate.name, candidate.id);
                self.target = Some(Target {
                    id: candidate.id.clone(),
                    device: candidate.handle.clone(),
                });
                self.state = LinkState::Connecting;
                Ok(vec![
                    Effect::StopScan,
                    Effect::Connect(candidate.handle.clone()),
                ])
            }
            state if state.has_session() => Err(LinkError::SessionActive),
            // A powered adapter is always scanning when no session is
            // active, so Idle means the hardware is not usable yet.
            _ => Err(LinkError::HardwareUnavailable),
        }
    }

    /// Tears the session down from any active state. A no-op when no session
    /// exists.
    pub fn request_disconnect(&mut self) -> Vec<Effect<R>> {
        if self.state == LinkState::Disconnecting {
            debug!("Disconnect already in progress");
            return Vec::new();
        }
        let Some(target) = self.target.as_ref() else {
            debug!("Disconnect requested with no active session");
            return Vec::new();
        };
        info!("Disconnecting from {}", target.id);
        let device = target.device.clone();
        self.channel = None;
        self.pending_discoveries = 0;
        self.state = LinkState::Disconnecting;
        vec![Effect::Disconnect(device)]
    }

    /// Submits a payload over the negotiated channel. Valid only in `Ready`;
    /// otherwise fails without queuing and without touching the radio.
    pub fn request_send(&mut self, payload: Vec<u8>) -> Result<Vec<Effect<R>>, LinkError> {
        match (&self.state, &self.channel) {
            (LinkState::Ready, Some(channel)) => Ok(vec![Effect::Write {
                channel: channel.clone(),
                payload,
            }]),
            _ => Err(LinkError::ChannelNotReady),
        }
    }

    fn on_power_changed(&mut self, power: PowerState) -> Vec<Effect<R>> {
        let powered = power == PowerState::On;
        if powered == self.powered {
            return Vec::new();
        }
        self.powered = powered;
        if powered {
            info!("Adapter powered on");
            if self.state == LinkState::Idle {
                return self.enter_scanning();
            }
            return Vec::new();
        }

        // Power loss halts everything until the next power-on event.
        info!("Adapter power lost, halting");
        match self.state {
            LinkState::Idle => Vec::new(),
            LinkState::Scanning => {
                self.state = LinkState::Idle;
                vec![Effect::StopScan, Effect::ClearDevices]
            }
            _ => {
                self.target = None;
                self.channel = None;
                self.pending_discoveries = 0;
                self.state = LinkState::Idle;
                vec![Effect::TeardownLink, Effect::ClearDevices]
            }
        }
    }

    fn on_advertisement(&mut self, adv: RawAdvertisement<R::Device>) -> Vec<Effect<R>> {
        if self.state != LinkState::Scanning {
            debug!("Ignoring advertisement outside a scan pass: {}", adv.id);
            return Vec::new();
        }
        vec![Effect::RegisterCandidate(adv)]
    }

    fn on_connected(&mut self) -> Vec<Effect<R>> {
        if self.state != LinkState::Connecting {
            warn!("Ignoring stale connected callback in {:?}", self.state);
            return Vec::new();
        }
        let Some(target) = self.target.as_ref() else {
            warn!("Connected callback with no target device");
            return Vec::new();
        };
        let device = target.device.clone();
        info!("Connected, discovering target service");
        self.state = LinkState::DiscoveringServices;
        vec![
            Effect::WatchDisconnect(device.clone()),
            Effect::DiscoverServices(device),
        ]
    }

    fn on_connect_failed(&mut self, reason: String) -> Vec<Effect<R>> {
        if self.state != LinkState::Connecting {
            warn!("Ignoring stale connect failure in {:?}: {reason}", self.state);
            return Vec::new();
        }
        self.fail(LinkError::ConnectFailed(reason))
    }

    fn on_services_discovered(&mut self, services: Vec<R::Service>) -> Vec<Effect<R>> {
        if self.state != LinkState::DiscoveringServices {
            warn!("Ignoring stale service discovery in {:?}", self.state);
            return Vec::new();
        }
        if services.is_empty() {
            return self.fail(LinkError::DiscoveryFailed(format!(
                "service {} not found",
                self.config.service_uuid
            )));
        }
        info!(
            "Found {} matching service(s), discovering characteristics",
            services.len()
        );
        self.pending_discoveries = services.len();
        self.state = LinkState::DiscoveringCharacteristics;
        services
            .into_iter()
            .map(Effect::DiscoverCharacteristics)
            .collect()
    }

    fn on_characteristics_discovered(
        &mut self,
        characteristics: Vec<CharacteristicInfo<R::Characteristic>>,
    ) -> Vec<Effect<R>> {
        if !matches!(
            self.state,
            LinkState::DiscoveringCharacteristics | LinkState::Ready
        ) {
            warn!("Ignoring stale characteristic discovery in {:?}", self.state);
            return Vec::new();
        }
        self.pending_discoveries = self.pending_discoveries.saturating_sub(1);

        let mut effects = Vec::new();
        for info in characteristics {
            if info.uuid != self.config.characteristic_uuid || !info.can_write {
                debug!("Skipping characteristic {} (no write capability or wrong id)", info.uuid);
                continue;
            }
            // When several services expose a matching characteristic, the
            // last one discovered wins; discovery ordering across services is
            // backend-defined.
            if self.channel.is_some() {
                warn!("Multiple matching characteristics; keeping the latest");
            }
            info!("Found writable channel characteristic {}", info.uuid);
            self.channel = Some(info.handle.clone());
            effects.push(Effect::Subscribe(info.handle));
        }

        if self.channel.is_some() {
            if self.state != LinkState::Ready {
                info!("Channel negotiated, link is ready");
                self.state = LinkState::Ready;
            }
            return effects;
        }

        if self.pending_discoveries == 0 {
            return self.fail(LinkError::DiscoveryFailed(format!(
                "no writable characteristic {} in target service",
                self.config.characteristic_uuid
            )));
        }
        effects
    }

    fn on_characteristic_discovery_failed(&mut self, reason: String) -> Vec<Effect<R>> {
        if self.state != LinkState::DiscoveringCharacteristics {
            debug!("Ignoring characteristic discovery failure in {:?}: {reason}", self.state);
            return Vec::new();
        }
        self.pending_discoveries = self.pending_discoveries.saturating_sub(1);
        if self.pending_discoveries == 0 && self.channel.is_none() {
            return self.fail(LinkError::DiscoveryFailed(reason));
        }
        warn!("Characteristic discovery failed for one service: {reason}");
        Vec::new()
    }

    fn on_discovery_failed(&mut self, reason: String) -> Vec<Effect<R>> {
        if self.state != LinkState::DiscoveringServices {
            warn!("Ignoring stale discovery failure in {:?}: {reason}", self.state);
            return Vec::new();
        }
        self.fail(LinkError::DiscoveryFailed(reason))
    }

    fn on_disconnected(&mut self) -> Vec<Effect<R>> {
        match self.state {
            LinkState::Disconnecting => {
                info!("Disconnect confirmed");
                self.reset_link()
            }
            LinkState::Ready => {
                warn!("Link lost unexpectedly");
                self.reset_link()
            }
            LinkState::Connecting
            | LinkState::DiscoveringServices
            | LinkState::DiscoveringCharacteristics => {
                self.fail(LinkError::ConnectFailed("link lost during negotiation".into()))
            }
            _ => {
                debug!("Ignoring stale disconnect callback in {:?}", self.state);
                Vec::new()
            }
        }
    }

    fn on_inbound_data(&mut self, payload: Vec<u8>) -> Vec<Effect<R>> {
        if self.state != LinkState::Ready {
            debug!("Dropping inbound data outside ready state");
            return Vec::new();
        }
        vec![Effect::PublishInbound(payload)]
    }

    /// Starts a scan pass: the registry is cleared so candidates never
    /// outlive the pass that produced them.
    fn enter_scanning(&mut self) -> Vec<Effect<R>> {
        self.state = LinkState::Scanning;
        vec![Effect::ClearDevices, Effect::StartScan]
    }

    /// Terminal negotiation failure: reset fully and re-enter scanning.
    fn fail(&mut self, error: LinkError) -> Vec<Effect<R>> {
        warn!("Resetting link after failure: {error}");
        self.state = LinkState::Errored;
        self.reset_link()
    }

    /// Destroys the session and restarts scanning while powered.
    fn reset_link(&mut self) -> Vec<Effect<R>> {
        self.target = None;
        self.channel = None;
        self.pending_discoveries = 0;
        self.state = LinkState::Idle;
        let mut effects = vec![Effect::TeardownLink];
        if self.powered {
            effects.extend(self.enter_scanning());
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[derive(Debug)]
    struct TestRadio;

    impl RadioTypes for TestRadio {
        type Device = &'static str;
        type Service = &'static str;
        type Characteristic = &'static str;
    }

    type TestSession = Session<TestRadio>;
    type TestEffect = Effect<TestRadio>;

    fn session() -> TestSession {
        Session::new(LinkConfig::default())
    }

    fn channel_uuid() -> Uuid {
        LinkConfig::default().characteristic_uuid
    }

    fn candidate(id: &str) -> CandidateDevice<&'static str> {
        CandidateDevice {
            id: DeviceId::from(id),
            name: format!("ESP32-{id}"),
            rssi: -60,
            service_ids: Vec::new(),
            handle: "device",
        }
    }

    fn writable(handle: &'static str) -> CharacteristicInfo<&'static str> {
        CharacteristicInfo {
            uuid: channel_uuid(),
            can_write: true,
            handle,
        }
    }

    fn kinds(effects: &[TestEffect]) -> Vec<&'static str> {
        effects.iter().map(Effect::kind).collect()
    }

    /// Drives a fresh session to `Ready` over a single matching service.
    fn ready_session() -> TestSession {
        let mut s = session();
        s.radio_event(RadioEvent::PowerChanged(PowerState::On));
        s.request_connect(&candidate("a")).unwrap();
        s.radio_event(RadioEvent::Connected);
        s.radio_event(RadioEvent::ServicesDiscovered(vec!["svc"]));
        s.radio_event(RadioEvent::CharacteristicsDiscovered(vec![writable("char")]));
        assert_eq!(s.state(), LinkState::Ready);
        s
    }

    /// The channel handle must be present exactly in the ready state.
    fn assert_channel_invariant(s: &TestSession) {
        assert_eq!(s.channel().is_some(), s.state() == LinkState::Ready);
    }

    #[test]
    fn power_on_enters_scanning_with_cleared_registry() {
        let mut s = session();
        let effects = s.radio_event(RadioEvent::PowerChanged(PowerState::On));
        assert_eq!(s.state(), LinkState::Scanning);
        assert_eq!(kinds(&effects), ["ClearDevices", "StartScan"]);
    }

    #[test]
    fn scan_request_requires_power() {
        let mut s = session();
        assert_eq!(s.request_scan().unwrap_err(), LinkError::HardwareUnavailable);
    }

    #[test]
    fn happy_path_reaches_ready_and_upholds_channel_invariant() {
        let mut s = session();
        assert_channel_invariant(&s);

        s.radio_event(RadioEvent::PowerChanged(PowerState::On));
        assert_channel_invariant(&s);

        let effects = s.request_connect(&candidate("a")).unwrap();
        assert_eq!(s.state(), LinkState::Connecting);
        assert_eq!(kinds(&effects), ["StopScan", "Connect"]);
        assert_channel_invariant(&s);

        let effects = s.radio_event(RadioEvent::Connected);
        assert_eq!(s.state(), LinkState::DiscoveringServices);
        assert_eq!(kinds(&effects), ["WatchDisconnect", "DiscoverServices"]);
        assert_channel_invariant(&s);

        let effects = s.radio_event(RadioEvent::ServicesDiscovered(vec!["svc"]));
        assert_eq!(s.state(), LinkState::DiscoveringCharacteristics);
        assert_eq!(kinds(&effects), ["DiscoverCharacteristics"]);
        assert_channel_invariant(&s);

        let effects = s.radio_event(RadioEvent::CharacteristicsDiscovered(vec![writable("char")]));
        assert_eq!(s.state(), LinkState::Ready);
        assert_eq!(kinds(&effects), ["Subscribe"]);
        assert_eq!(s.channel(), Some(&"char"));
    }

    #[test]
    fn advertisements_register_only_while_scanning() {
        let mut s = session();
        let adv = RawAdvertisement {
            id: DeviceId::from("a"),
            name: Some("ESP32-Demo".to_string()),
            rssi: Some(-60),
            service_ids: Vec::new(),
            device: "device",
        };
        assert!(s.radio_event(RadioEvent::Advertisement(adv.clone())).is_empty());

        s.radio_event(RadioEvent::PowerChanged(PowerState::On));
        let effects = s.radio_event(RadioEvent::Advertisement(adv));
        assert_eq!(kinds(&effects), ["RegisterCandidate"]);
    }

    #[test]
    fn send_outside_ready_is_rejected_without_effects() {
        let mut s = session();
        assert_eq!(
            s.request_send(b"LED_ON".to_vec()).unwrap_err(),
            LinkError::ChannelNotReady
        );

        s.radio_event(RadioEvent::PowerChanged(PowerState::On));
        s.request_connect(&candidate("a")).unwrap();
        assert_eq!(
            s.request_send(b"LED_ON".to_vec()).unwrap_err(),
            LinkError::ChannelNotReady
        );
    }

    #[test]
    fn send_in_ready_writes_the_payload() {
        let mut s = ready_session();
        let effects = s.request_send(b"LED_ON".to_vec()).unwrap();
        match &effects[..] {
            [Effect::Write { channel, payload }] => {
                assert_eq!(*channel, "char");
                assert_eq!(payload, b"LED_ON");
            }
            other => panic!("expected a single write effect, got {:?}", kinds(other)),
        }
    }

    #[test]
    fn connect_failure_resets_and_rescans() {
        let mut s = session();
        s.radio_event(RadioEvent::PowerChanged(PowerState::On));
        s.request_connect(&candidate("a")).unwrap();

        let effects = s.radio_event(RadioEvent::ConnectFailed {
            reason: "peer refused".into(),
        });
        assert_eq!(s.state(), LinkState::Scanning);
        assert_eq!(kinds(&effects), ["TeardownLink", "ClearDevices", "StartScan"]);
        assert!(s.target_id().is_none());
        assert_channel_invariant(&s);
    }

    #[test]
    fn empty_service_discovery_is_a_failure() {
        let mut s = session();
        s.radio_event(RadioEvent::PowerChanged(PowerState::On));
        s.request_connect(&candidate("a")).unwrap();
        s.radio_event(RadioEvent::Connected);

        let effects = s.radio_event(RadioEvent::ServicesDiscovered(Vec::new()));
        assert_eq!(s.state(), LinkState::Scanning);
        assert_eq!(kinds(&effects), ["TeardownLink", "ClearDevices", "StartScan"]);
    }

    #[test]
    fn no_writable_characteristic_fails_after_all_services_report() {
        let mut s = session();
        s.radio_event(RadioEvent::PowerChanged(PowerState::On));
        s.request_connect(&candidate("a")).unwrap();
        s.radio_event(RadioEvent::Connected);
        s.radio_event(RadioEvent::ServicesDiscovered(vec!["svc1", "svc2"]));

        let read_only = CharacteristicInfo {
            uuid: channel_uuid(),
            can_write: false,
            handle: "char",
        };
        let effects = s.radio_event(RadioEvent::CharacteristicsDiscovered(vec![read_only]));
        // One service still outstanding; not a failure yet.
        assert!(effects.is_empty());
        assert_eq!(s.state(), LinkState::DiscoveringCharacteristics);

        let effects = s.radio_event(RadioEvent::CharacteristicsDiscovered(Vec::new()));
        assert_eq!(s.state(), LinkState::Scanning);
        assert_eq!(kinds(&effects), ["TeardownLink", "ClearDevices", "StartScan"]);
    }

    #[test]
    fn last_discovered_matching_characteristic_wins() {
        let mut s = session();
        s.radio_event(RadioEvent::PowerChanged(PowerState::On));
        s.request_connect(&candidate("a")).unwrap();
        s.radio_event(RadioEvent::Connected);
        s.radio_event(RadioEvent::ServicesDiscovered(vec!["svc1", "svc2"]));

        let effects = s.radio_event(RadioEvent::CharacteristicsDiscovered(vec![writable("first")]));
        assert_eq!(s.state(), LinkState::Ready);
        assert_eq!(kinds(&effects), ["Subscribe"]);
        assert_eq!(s.channel(), Some(&"first"));

        let effects = s.radio_event(RadioEvent::CharacteristicsDiscovered(vec![writable("second")]));
        assert_eq!(s.state(), LinkState::Ready);
        assert_eq!(kinds(&effects), ["Subscribe"]);
        assert_eq!(s.channel(), Some(&"second"));
    }

    #[test]
    fn unexpected_disconnect_resets_and_rescans() {
        let mut s = ready_session();
        let effects = s.radio_event(RadioEvent::Disconnected);
        assert_eq!(s.state(), LinkState::Scanning);
        assert_eq!(kinds(&effects), ["TeardownLink", "ClearDevices", "StartScan"]);
        assert_channel_invariant(&s);
    }

    #[test]
    fn requested_disconnect_confirms_then_rescans() {
        let mut s = ready_session();

        let effects = s.request_disconnect();
        assert_eq!(s.state(), LinkState::Disconnecting);
        assert_eq!(kinds(&effects), ["Disconnect"]);
        assert_channel_invariant(&s);

        let effects = s.radio_event(RadioEvent::Disconnected);
        assert_eq!(s.state(), LinkState::Scanning);
        assert_eq!(kinds(&effects), ["TeardownLink", "ClearDevices", "StartScan"]);
    }

    #[test]
    fn disconnect_during_negotiation_goes_straight_to_disconnecting() {
        let mut s = session();
        s.radio_event(RadioEvent::PowerChanged(PowerState::On));
        s.request_connect(&candidate("a")).unwrap();
        s.radio_event(RadioEvent::Connected);

        let effects = s.request_disconnect();
        assert_eq!(s.state(), LinkState::Disconnecting);
        assert_eq!(kinds(&effects), ["Disconnect"]);
    }

    #[test]
    fn disconnect_with_no_session_is_a_noop() {
        let mut s = session();
        assert!(s.request_disconnect().is_empty());
        assert_eq!(s.state(), LinkState::Idle);

        s.radio_event(RadioEvent::PowerChanged(PowerState::On));
        assert!(s.request_disconnect().is_empty());
        assert_eq!(s.state(), LinkState::Scanning);
    }

    #[test]
    fn second_connect_request_is_rejected_while_active() {
        let mut s = session();
        s.radio_event(RadioEvent::PowerChanged(PowerState::On));
        s.request_connect(&candidate("a")).unwrap();
        assert_eq!(
            s.request_connect(&candidate("b")).unwrap_err(),
            LinkError::SessionActive
        );
    }

    #[test]
    fn power_loss_halts_until_next_power_on() {
        let mut s = ready_session();
        let effects = s.radio_event(RadioEvent::PowerChanged(PowerState::Off));
        assert_eq!(s.state(), LinkState::Idle);
        assert_eq!(kinds(&effects), ["TeardownLink", "ClearDevices"]);
        assert_channel_invariant(&s);
        assert_eq!(s.request_scan().unwrap_err(), LinkError::HardwareUnavailable);

        let effects = s.radio_event(RadioEvent::PowerChanged(PowerState::On));
        assert_eq!(s.state(), LinkState::Scanning);
        assert_eq!(kinds(&effects), ["ClearDevices", "StartScan"]);
    }

    #[test]
    fn failure_while_unpowered_stays_idle() {
        let mut s = session();
        s.radio_event(RadioEvent::PowerChanged(PowerState::On));
        s.request_connect(&candidate("a")).unwrap();
        s.radio_event(RadioEvent::PowerChanged(PowerState::Off));
        assert_eq!(s.state(), LinkState::Idle);

        // A straggling failure callback must not restart the scan.
        let effects = s.radio_event(RadioEvent::ConnectFailed {
            reason: "timed out".into(),
        });
        assert!(effects.is_empty());
        assert_eq!(s.state(), LinkState::Idle);
    }

    #[test]
    fn inbound_data_publishes_only_in_ready() {
        let mut s = session();
        assert!(s.radio_event(RadioEvent::InboundData(vec![0x01])).is_empty());

        let mut s = ready_session();
        let effects = s.radio_event(RadioEvent::InboundData(vec![0x01]));
        assert_eq!(kinds(&effects), ["PublishInbound"]);
    }

    #[test]
    fn rescan_request_restarts_the_pass() {
        let mut s = session();
        s.radio_event(RadioEvent::PowerChanged(PowerState::On));
        let effects = s.request_scan().unwrap();
        assert_eq!(kinds(&effects), ["StopScan", "ClearDevices", "StartScan"]);
        assert_eq!(s.state(), LinkState::Scanning);
    }
}
