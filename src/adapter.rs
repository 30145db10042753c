//! Production radio backend.
//! Implements the [`Radio`] boundary on top of the system Bluetooth stack
//! via `bluest`. Every request spawns its own task and reports the outcome
//! through the event channel, so the driver never blocks on the radio.

use async_trait::async_trait;
use bluest::{Adapter, Characteristic, ConnectionEvent, Device, Service};
use futures_util::StreamExt;
use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::LinkError;
use crate::radio::{EventSender, Radio, RadioEvent, RadioTypes};
use crate::types::{CharacteristicInfo, DeviceId, PowerState, RawAdvertisement};

/// Radio backed by the default system adapter.
#[derive(Clone)]
pub struct BluestRadio {
    adapter: Adapter,
}

impl BluestRadio {
    /// Binds to the default Bluetooth adapter.
    pub async fn new() -> Result<Self, LinkError> {
        let adapter = Adapter::default()
            .await
            .ok_or(LinkError::HardwareUnavailable)?;
        Ok(Self { adapter })
    }
}

impl RadioTypes for BluestRadio {
    type Device = Device;
    type Service = Service;
    type Characteristic = Characteristic;
}

#[async_trait]
impl Radio for BluestRadio {
    async fn watch_power(&self, events: EventSender<Self>) {
        let adapter = self.adapter.clone();
        tokio::spawn(async move {
            // The system stack reports availability, not a power stream; the
            // link stays halted until this resolves.
            match adapter.wait_available().await {
                Ok(()) => {
                    info!("Bluetooth adapter is available.");
                    let _ = events.send(RadioEvent::PowerChanged(PowerState::On));
                }
                Err(e) => {
                    error!("Bluetooth adapter did not become available: {e}");
                    let _ = events.send(RadioEvent::PowerChanged(PowerState::Unknown));
                }
            }
        });
    }

    async fn scan(&self, events: EventSender<Self>, cancel: CancellationToken) {
        let adapter = self.adapter.clone();
        tokio::spawn(async move {
            info!("Starting bluetooth scan");
            let mut scan_stream = match adapter.scan(&[]).await {
                Ok(stream) => stream,
                Err(e) => {
                    error!("Failed to start scan: {e}");
                    return;
                }
            };

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    discovered = scan_stream.next() => match discovered {
                        Some(discovered) => {
                            debug!(
                                "Found device: {:?}, RSSI: {:?}",
                                discovered.device, discovered.rssi
                            );
                            let name = discovered
                                .adv_data
                                .local_name
                                .clone()
                                .or_else(|| discovered.device.name().ok());
                            let adv = RawAdvertisement {
                                id: DeviceId::new(discovered.device.id().to_string()),
                                name,
                                rssi: discovered.rssi,
                                service_ids: discovered.adv_data.services.iter().copied().collect(),
                                device: discovered.device,
                            };
                            let _ = events.send(RadioEvent::Advertisement(adv));
                        }
                        None => {
                            info!("Bluetooth scan stream has ended.");
                            break;
                        }
                    }
                }
            }
            info!("Scan stopped");
        });
    }

    async fn connect(&self, device: Device, events: EventSender<Self>) {
        let adapter = self.adapter.clone();
        tokio::spawn(async move {
            if device.is_connected().await {
                info!("Device {} already connected.", device.id());
                let _ = events.send(RadioEvent::Connected);
                return;
            }
            info!("Initiating connection to {}...", device.id());
            match adapter.connect_device(&device).await {
                Ok(()) => {
                    info!("Connection successful");
                    let _ = events.send(RadioEvent::Connected);
                }
                Err(e) => {
                    let _ = events.send(RadioEvent::ConnectFailed {
                        reason: e.to_string(),
                    });
                }
            }
        });
    }

    async fn watch_disconnect(
        &self,
        device: Device,
        events: EventSender<Self>,
        cancel: CancellationToken,
    ) {
        let adapter = self.adapter.clone();
        tokio::spawn(async move {
            let mut connection_events = match adapter.device_connection_events(&device).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Cannot watch connection events for {}: {e}", device.id());
                    return;
                }
            };
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = connection_events.next() => match event {
                        Some(ConnectionEvent::Disconnected) => {
                            warn!("Device {} reported disconnected", device.id());
                            let _ = events.send(RadioEvent::Disconnected);
                            break;
                        }
                        Some(ConnectionEvent::Connected) => {
                            debug!("Device {} reported connected", device.id());
                        }
                        None => break,
                    }
                }
            }
        });
    }

    async fn disconnect(&self, device: Device, events: EventSender<Self>) {
        let adapter = self.adapter.clone();
        tokio::spawn(async move {
            if !device.is_connected().await {
                info!("Device {} not connected", device.id());
                let _ = events.send(RadioEvent::Disconnected);
                return;
            }
            info!("Disconnecting from device {}", device.id());
            match adapter.disconnect_device(&device).await {
                Ok(()) => info!("Successfully disconnected"),
                // Report torn down either way; the session must not park in
                // a disconnecting state waiting for a confirmation that will
                // never come.
                Err(e) => error!("Disconnect failed: {e}"),
            }
            let _ = events.send(RadioEvent::Disconnected);
        });
    }

    async fn discover_services(&self, device: Device, service: Uuid, events: EventSender<Self>) {
        tokio::spawn(async move {
            info!("Discovering service {service} on {}", device.id());
            match device.discover_services_with_uuid(service).await {
                Ok(services) => {
                    let _ = events.send(RadioEvent::ServicesDiscovered(services));
                }
                Err(e) => {
                    let _ = events.send(RadioEvent::ServiceDiscoveryFailed {
                        reason: e.to_string(),
                    });
                }
            }
        });
    }

    async fn discover_characteristics(
        &self,
        service: Service,
        characteristic: Uuid,
        events: EventSender<Self>,
    ) {
        tokio::spawn(async move {
            info!("Discovering characteristic {characteristic}");
            match service.discover_characteristics_with_uuid(characteristic).await {
                Ok(characteristics) => {
                    let mut infos = Vec::with_capacity(characteristics.len());
                    for ch in characteristics {
                        let can_write = match ch.properties().await {
                            Ok(props) => props.write || props.write_without_response,
                            Err(e) => {
                                warn!("Could not read properties of {}: {e}", ch.uuid());
                                false
                            }
                        };
                        infos.push(CharacteristicInfo {
                            uuid: ch.uuid(),
                            can_write,
                            handle: ch,
                        });
                    }
                    let _ = events.send(RadioEvent::CharacteristicsDiscovered(infos));
                }
                Err(e) => {
                    let _ = events.send(RadioEvent::CharacteristicDiscoveryFailed {
                        reason: e.to_string(),
                    });
                }
            }
        });
    }

    async fn write(&self, channel: Characteristic, payload: Vec<u8>, events: EventSender<Self>) {
        tokio::spawn(async move {
            debug!("Writing {} bytes to {}", payload.len(), channel.uuid());
            match channel.write(&payload).await {
                Ok(()) => debug!("Write acknowledged"),
                Err(e) => {
                    let _ = events.send(RadioEvent::WriteFailed {
                        reason: e.to_string(),
                    });
                }
            }
        });
    }

    async fn subscribe(
        &self,
        channel: Characteristic,
        events: EventSender<Self>,
        cancel: CancellationToken,
    ) {
        tokio::spawn(async move {
            info!("Subscribing to notifications on {}", channel.uuid());
            let mut notifications = match channel.notify().await {
                Ok(stream) => stream,
                Err(e) => {
                    error!("Failed to subscribe to notifications: {e}");
                    return;
                }
            };
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    result = notifications.next() => match result {
                        Some(Ok(value)) => {
                            debug!("Received {} bytes from peripheral", value.len());
                            let _ = events.send(RadioEvent::InboundData(value));
                        }
                        Some(Err(e)) => {
                            error!("Error in notification stream: {e}");
                            break;
                        }
                        None => break,
                    }
                }
            }
            info!("Notification stream ended");
        });
    }
}
