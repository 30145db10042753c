//! Link configuration.
//! A deployment binds the peripheral identification constants once at
//! startup, either from the compiled-in defaults or from a JSON file.

use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use crate::constants::{DEFAULT_MIN_RSSI, PERIPHERAL_NAME_MARKER, UUID_LED_CHAR, UUID_LED_SERVICE};
use crate::error::LinkError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Substring a peripheral's advertised name must contain to be treated
    /// as a candidate. Deliberately a name match rather than a service-UUID
    /// filter: the peripheral advertises the marker name before exposing its
    /// service UUID.
    pub device_name_marker: String,

    /// UUID of the data service. Discovery is scoped to this service only.
    pub service_uuid: Uuid,

    /// UUID of the data characteristic within the service.
    pub characteristic_uuid: Uuid,

    /// Minimum signal strength (dBm) for a candidate. Advertisements without
    /// a reported RSSI count as weakest possible.
    pub min_rssi: i16,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            device_name_marker: PERIPHERAL_NAME_MARKER.to_string(),
            service_uuid: UUID_LED_SERVICE,
            characteristic_uuid: UUID_LED_CHAR,
            min_rssi: DEFAULT_MIN_RSSI,
        }
    }
}

impl LinkConfig {
    /// Loads the config from a JSON file, falling back to the defaults when
    /// the file does not exist.
    pub async fn load(path: &Path) -> Result<Self, LinkError> {
        if !path.exists() {
            warn!("Config file not found at {:?}, using defaults.", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| LinkError::Config(format!("failed to read {:?}: {}", path, e)))?;
        let config = serde_json::from_str(&contents)
            .map_err(|e| LinkError::Config(format!("failed to parse {:?}: {}", path, e)))?;
        info!("Loaded link config from {:?}", path);
        Ok(config)
    }

    /// Saves the config as JSON.
    pub async fn save(&self, path: &Path) -> Result<(), LinkError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| LinkError::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(path, contents)
            .await
            .map_err(|e| LinkError::Config(format!("failed to write {:?}: {}", path, e)))?;
        info!("Saved link config to {:?}", path);
        Ok(())
    }
}
