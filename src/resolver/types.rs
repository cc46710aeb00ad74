//! Resolver wire types — spec.md §4.5 "Request shaping", §4.6.
//!
//! These are the five request shapes and two response envelopes named in
//! the spec. Clients MUST tolerate additional fields on responses
//! (spec.md §6), so every response struct is `#[serde(default)]` on its
//! optional parts rather than failing on unknown keys.

use crate::model::{AntennaLocation, UplinkReception, WifiAccessPoint};
use serde::{Deserialize, Serialize};

/// One gateway's reception, shaped for the TDOA/WiFi-TDOA endpoints.
/// `toa` is the fine timestamp in nanoseconds; per spec.md §9 Open
/// Question (a), the WiFi request builder zeroes it even when a fine
/// timestamp is present on the reception — preserved here intentionally.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UplinkTdoa {
    pub gateway_id: String,
    pub rssi: i32,
    pub snr: f64,
    pub toa: u64,
    pub antenna_location: [f64; 3],
}

/// One gateway's reception, shaped for the RSSI endpoints (no `toa`).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UplinkRssi {
    pub gateway_id: String,
    pub rssi: i32,
    pub snr: f64,
    pub antenna_location: [f64; 3],
}

impl UplinkTdoa {
    pub fn from_reception(rx: &UplinkReception, toa: u64) -> Self {
        Self {
            gateway_id: hex::encode(rx.gateway_id),
            rssi: rx.rssi,
            snr: rx.snr,
            toa,
            antenna_location: location_array(rx.antenna_location),
        }
    }
}

impl UplinkRssi {
    pub fn from_reception(rx: &UplinkReception) -> Self {
        Self {
            gateway_id: hex::encode(rx.gateway_id),
            rssi: rx.rssi,
            snr: rx.snr,
            antenna_location: location_array(rx.antenna_location),
        }
    }
}

fn location_array(loc: AntennaLocation) -> [f64; 3] {
    [loc.latitude, loc.longitude, loc.altitude]
}

#[derive(Debug, Clone, Serialize)]
pub struct TdoaSingleFrameRequest {
    pub lorawan: Vec<UplinkTdoa>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TdoaMultiFrameRequest {
    pub lorawan: Vec<Vec<UplinkTdoa>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RssiSingleFrameRequest {
    pub lorawan: Vec<UplinkRssi>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RssiMultiFrameRequest {
    pub lorawan: Vec<Vec<UplinkRssi>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WifiApRequest {
    pub mac_address: String,
    pub signal_strength: i32,
}

impl From<&WifiAccessPoint> for WifiApRequest {
    fn from(ap: &WifiAccessPoint) -> Self {
        use base64::Engine;
        Self {
            mac_address: base64::engine::general_purpose::STANDARD.encode(ap.mac_address),
            signal_strength: ap.signal_strength,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WifiTdoaSingleFrameRequest {
    pub lorawan: Vec<UplinkTdoa>,
    pub wifi_access_points: Vec<WifiApRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GnssLr1110SingleFrameRequest {
    /// Hex-encoded GNSS scan payload.
    pub payload: String,
    pub gnss_assist_position: [f64; 2],
    pub gnss_assist_altitude: f64,
    /// Only present when `geolocation_gnss_use_rx_time` is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gnss_capture_time: Option<i64>,
}

/// A resolved fix, stripped of the strategy-specific provenance the
/// orchestrator attaches afterward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub accuracy: f64,
}

/// Outcome of a resolver call (spec.md §4.6, §7 — `NoLocation` is a
/// sentinel, never an error value).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolverOutcome {
    Fix(ResolvedFix),
    NoLocation,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct LocationResult {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub accuracy: f64,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct ResolverResponseBody {
    #[serde(default)]
    pub result: Option<LocationResult>,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

impl From<ResolverResponseBody> for ResolverOutcome {
    fn from(body: ResolverResponseBody) -> Self {
        match body.result {
            Some(r) => ResolverOutcome::Fix(ResolvedFix {
                latitude: r.latitude,
                longitude: r.longitude,
                altitude: r.altitude,
                accuracy: r.accuracy,
            }),
            None => ResolverOutcome::NoLocation,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct GnssLocationResult {
    pub llh: [f64; 3],
    pub accuracy: f64,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct GnssResponseBody {
    #[serde(default)]
    pub result: Option<GnssLocationResult>,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

impl From<GnssResponseBody> for ResolverOutcome {
    fn from(body: GnssResponseBody) -> Self {
        match body.result {
            Some(r) => ResolverOutcome::Fix(ResolvedFix {
                latitude: r.llh[0],
                longitude: r.llh[1],
                altitude: r.llh[2],
                accuracy: r.accuracy,
            }),
            None => ResolverOutcome::NoLocation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_with_result_is_a_fix() {
        let body = ResolverResponseBody {
            result: Some(LocationResult {
                latitude: 1.1,
                longitude: 2.2,
                altitude: 3.3,
                accuracy: 10.0,
            }),
            errors: None,
        };
        assert_eq!(
            ResolverOutcome::from(body),
            ResolverOutcome::Fix(ResolvedFix {
                latitude: 1.1,
                longitude: 2.2,
                altitude: 3.3,
                accuracy: 10.0,
            })
        );
    }

    #[test]
    fn response_without_result_is_no_location() {
        let body = ResolverResponseBody {
            result: None,
            errors: Some(vec!["NO_LOCATION".to_string()]),
        };
        assert_eq!(ResolverOutcome::from(body), ResolverOutcome::NoLocation);
    }

    #[test]
    fn gnss_response_reads_llh_triplet() {
        let body = GnssResponseBody {
            result: Some(GnssLocationResult {
                llh: [1.123, 2.123, 3.123],
                accuracy: 10.0,
            }),
            errors: None,
        };
        assert_eq!(
            ResolverOutcome::from(body),
            ResolverOutcome::Fix(ResolvedFix {
                latitude: 1.123,
                longitude: 2.123,
                altitude: 3.123,
                accuracy: 10.0,
            })
        );
    }
}
