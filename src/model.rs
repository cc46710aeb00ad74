//! Core data model — spec.md §3.
//!
//! Plain data, no behavior beyond `Display`/`serde` plumbing. The
//! orchestrator and resolver client build their request/response shapes
//! out of these types; they never leak a fixed shape back onto device
//! payload parsing (see `extract.rs`).

use std::collections::HashMap;
use std::fmt;

/// 8-byte LoRaWAN device EUI. Immutable, used as the buffer's primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DeviceId(pub [u8; 8]);

impl DeviceId {
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Key used to address this device's entry in the buffer store.
    pub fn store_key(&self) -> String {
        format!("geoloc:{}", hex::encode(self.0))
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// One gateway's reception of one uplink frame.
#[derive(Debug, Clone, PartialEq)]
pub struct UplinkReception {
    pub gateway_id: [u8; 8],
    /// Opaque id, unique per reception, that flows unchanged into the
    /// resolver request and back out on `LocationEvent::uplink_ids`.
    pub uplink_id: Vec<u8>,
    pub rssi: i32,
    pub snr: f64,
    pub antenna_location: AntennaLocation,
    /// Sub-microsecond time of arrival in nanoseconds, present only on
    /// TDOA-capable gateways.
    pub fine_timestamp: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AntennaLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Ordered sequence of per-gateway receptions of one uplink event. Order
/// is preserved end-to-end into the resolver request.
pub type Frame = Vec<UplinkReception>;

/// The minimum reception count for a frame to be worth buffering at all
/// (spec.md §3 GeolocBuffer invariant (i), §4.2 step 2).
pub const MIN_FRAME_SIZE: usize = 3;

/// Inbound event from the dispatcher (spec.md §3 UplinkEvent).
#[derive(Debug, Clone)]
pub struct UplinkEvent {
    pub application_id: u64,
    pub application_name: String,
    pub device_name: String,
    pub dev_eui: DeviceId,
    pub f_cnt: u32,
    pub rx_info: Frame,
    /// JSON object string carrying device-decoded fields; possibly empty.
    pub object_json: String,
    pub tags: HashMap<String, String>,
}

/// A WiFi access point observed alongside an uplink, decoded from the
/// configured object-JSON field (spec.md §4.4).
#[derive(Debug, Clone, PartialEq)]
pub struct WifiAccessPoint {
    pub mac_address: [u8; 6],
    pub signal_strength: i32,
}

/// Provenance of a resolved location (spec.md §4.5 "source tagging").
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LocationSource {
    #[serde(rename = "GEO_RESOLVER_TDOA")]
    Tdoa,
    #[serde(rename = "GEO_RESOLVER_RSSI")]
    Rssi,
    #[serde(rename = "GEO_RESOLVER_GNSS")]
    Gnss,
    #[serde(rename = "GEO_RESOLVER_WIFI")]
    Wifi,
}

/// A resolved location fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub accuracy: f64,
    pub source: LocationSource,
}

/// Outbound event emitted back into the integration bus (spec.md §3
/// LocationEvent).
#[derive(Debug, Clone)]
pub struct LocationEvent {
    pub application_id: u64,
    pub application_name: String,
    pub device_name: String,
    pub dev_eui: DeviceId,
    pub tags: HashMap<String, String>,
    /// Flattened, in-order uplink ids for TDOA/RSSI; empty for GNSS/WiFi.
    pub uplink_ids: Vec<Vec<u8>>,
    /// Populated only when `uplink_ids` is empty (GNSS/WiFi).
    pub f_cnt: Option<u32>,
    pub location: Location,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_store_key_is_stable_hex() {
        let id = DeviceId([1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(id.store_key(), "geoloc:0102030405060708");
        assert_eq!(id.to_string(), "0102030405060708");
    }
}
