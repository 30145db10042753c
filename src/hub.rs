//! Notification hub.
//! Publishes link state, device list updates, and inbound data to external
//! observers (the presentation layer).

use tokio::sync::watch;

use crate::session::LinkState;
use crate::types::DeviceSummary;

/// Publish side of the three observable streams.
///
/// Delivery is synchronous and best-effort: `watch` retains only the latest
/// value, never blocks the producer, and tolerates zero or slow receivers.
#[derive(Debug)]
pub struct NotificationHub {
    device_list: watch::Sender<Vec<DeviceSummary>>,
    link_state: watch::Sender<LinkState>,
    inbound_flag: watch::Sender<Option<bool>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        let (device_list, _) = watch::channel(Vec::new());
        let (link_state, _) = watch::channel(LinkState::Idle);
        let (inbound_flag, _) = watch::channel(None);
        Self {
            device_list,
            link_state,
            inbound_flag,
        }
    }

    /// Candidate devices of the current scan pass, discovery order.
    pub fn device_list(&self) -> watch::Receiver<Vec<DeviceSummary>> {
        self.device_list.subscribe()
    }

    /// Current state-machine state.
    pub fn link_state(&self) -> watch::Receiver<LinkState> {
        self.link_state.subscribe()
    }

    /// Last flag value pushed by the peripheral; `None` until the first
    /// notification arrives.
    pub fn inbound_flag(&self) -> watch::Receiver<Option<bool>> {
        self.inbound_flag.subscribe()
    }

    pub(crate) fn publish_device_list(&self, devices: Vec<DeviceSummary>) {
        self.device_list.send_replace(devices);
    }

    pub(crate) fn publish_link_state(&self, state: LinkState) {
        self.link_state.send_replace(state);
    }

    pub(crate) fn publish_inbound_flag(&self, flag: bool) {
        self.inbound_flag.send_replace(Some(flag));
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}
