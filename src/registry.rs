//! Device registry.
//! The deduplicated, order-preserving collection of candidate peripherals
//! found during a scan pass.

use log::debug;

use crate::types::{CandidateDevice, DeviceId, DeviceSummary};

/// Candidates discovered in the current scan pass, in discovery order.
///
/// Entries are only valid for the pass that produced them; the driver resets
/// the registry at the start of every pass and on disconnect.
#[derive(Debug)]
pub struct DeviceRegistry<D> {
    devices: Vec<CandidateDevice<D>>,
}

impl<D> DeviceRegistry<D> {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    /// Clears all entries.
    pub fn reset(&mut self) {
        self.devices.clear();
    }

    /// Inserts the candidate unless an entry with the same identity already
    /// exists. First seen wins: a rescan within the same pass does not
    /// refresh the stored signal strength. Returns whether an insertion
    /// occurred.
    pub fn upsert(&mut self, candidate: CandidateDevice<D>) -> bool {
        if self.devices.iter().any(|d| d.id == candidate.id) {
            debug!("Already registered: {}", candidate.id);
            return false;
        }
        self.devices.push(candidate);
        true
    }

    /// Current candidates, insertion order.
    pub fn list(&self) -> &[CandidateDevice<D>] {
        &self.devices
    }

    pub fn get(&self, id: &DeviceId) -> Option<&CandidateDevice<D>> {
        self.devices.iter().find(|d| &d.id == id)
    }

    /// Handle-free projection for observers.
    pub fn summaries(&self) -> Vec<DeviceSummary> {
        self.devices.iter().map(CandidateDevice::summary).collect()
    }
}

impl<D> Default for DeviceRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, rssi: i16) -> CandidateDevice<u8> {
        CandidateDevice {
            id: DeviceId::from(id),
            name: format!("ESP32-{id}"),
            rssi,
            service_ids: Vec::new(),
            handle: 0,
        }
    }

    #[test]
    fn upsert_deduplicates_by_identity() {
        let mut registry = DeviceRegistry::new();
        assert!(registry.upsert(candidate("a", -60)));
        assert!(registry.upsert(candidate("b", -70)));
        assert!(!registry.upsert(candidate("a", -40)));
        assert_eq!(registry.list().len(), 2);
    }

    #[test]
    fn first_seen_wins_keeps_original_rssi() {
        let mut registry = DeviceRegistry::new();
        registry.upsert(candidate("a", -60));
        registry.upsert(candidate("a", -40));
        assert_eq!(registry.get(&DeviceId::from("a")).unwrap().rssi, -60);
    }

    #[test]
    fn list_preserves_insertion_order() {
        let mut registry = DeviceRegistry::new();
        for id in ["c", "a", "b"] {
            registry.upsert(candidate(id, -60));
        }
        let ids: Vec<_> = registry.list().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn reset_empties_the_registry() {
        let mut registry = DeviceRegistry::new();
        registry.upsert(candidate("a", -60));
        registry.reset();
        assert!(registry.list().is_empty());
        assert!(registry.summaries().is_empty());
    }
}
