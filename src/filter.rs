//! Advertisement filter.
//! Decides whether a raw advertisement names a candidate peripheral.

use crate::config::LinkConfig;
use crate::types::{CandidateDevice, RawAdvertisement};

/// Acceptance rule for discovered advertisements. Pure; no side effects.
#[derive(Debug, Clone)]
pub struct AdvertisementFilter {
    marker: String,
    min_rssi: i16,
}

impl AdvertisementFilter {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            marker: config.device_name_marker.clone(),
            min_rssi: config.min_rssi,
        }
    }

    /// Accepts the advertisement if its name contains the configured marker
    /// and the signal is at or above the floor. A missing RSSI counts as
    /// weakest possible.
    pub fn accept<D>(&self, adv: RawAdvertisement<D>) -> Option<CandidateDevice<D>> {
        let name = adv.name?;
        if !name.contains(&self.marker) {
            return None;
        }

        let rssi = adv.rssi.unwrap_or(i16::MIN);
        if rssi < self.min_rssi {
            return None;
        }

        Some(CandidateDevice {
            id: adv.id,
            name,
            rssi,
            service_ids: adv.service_ids,
            handle: adv.device,
        })
    }
}
