//! Constants used throughout the crate
//! This module contains the default deployment constants: the peripheral
//! family marker and the UUIDs of the data service and characteristic.

use uuid::Uuid;

/// Marker substring advertised by the LED peripheral family
pub const PERIPHERAL_NAME_MARKER: &str = "ESP32";

/// The UUID of the LED control service
pub const UUID_LED_SERVICE: Uuid = Uuid::from_u128(0x4fafc201_1fb5_459e_8fcc_c5c9c331914b);

/// The UUID of the LED control characteristic (write + notify)
pub const UUID_LED_CHAR: Uuid = Uuid::from_u128(0xbeb5483e_36e1_4688_b7f5_ea07361b26a8);

/// Minimum signal strength for a candidate device, in dBm.
/// The default accepts every advertisement the adapter reports.
pub const DEFAULT_MIN_RSSI: i16 = -127;
