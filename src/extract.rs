//! Object-JSON extractors — spec.md §4.4.
//!
//! `object_json` is free-form, device-decoded data: a JSON object whose
//! shape we don't control. These accessors never try to deserialize it
//! into a fixed struct — they reach in for exactly one configured field
//! and fail descriptively if that field isn't shaped the way we expect.
//! Callers (the orchestrator) log failures and treat them as "no
//! extractable input" — see spec.md §4.4 and §7.

use crate::model::WifiAccessPoint;
use base64::Engine;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("invalid JSON object: {0}")]
    InvalidJson(String),
    #[error("field {field:?} is not a string")]
    TypeMismatch { field: String },
    #[error("field {field:?} is not a base64 string: {reason}")]
    InvalidBase64 { field: String, reason: String },
    #[error("field {field:?} is not a list of access points: {reason}")]
    InvalidShape { field: String, reason: String },
}

/// Decode the GNSS payload blob from `field` in `object_json`.
///
/// Empty input or a missing field both return an empty blob (no error —
/// "no GNSS payload available" is a normal outcome, not a failure).
pub fn gnss_payload(object_json: &str, field: &str) -> Result<Vec<u8>, ExtractError> {
    if object_json.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: serde_json::Value = serde_json::from_str(object_json)
        .map_err(|e| ExtractError::InvalidJson(e.to_string()))?;

    let Some(raw) = value.get(field) else {
        return Ok(Vec::new());
    };

    let Some(encoded) = raw.as_str() else {
        return Err(ExtractError::TypeMismatch {
            field: field.to_string(),
        });
    };

    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| ExtractError::InvalidBase64 {
            field: field.to_string(),
            reason: e.to_string(),
        })
}

/// Decode the WiFi access-point list from `field` in `object_json`.
///
/// Each entry must carry a `macAddress` (base64-encoded 6-byte MAC) and
/// a `signalStrength` (numeric, coerced to `i32`). Order is preserved.
pub fn wifi_access_points(
    object_json: &str,
    field: &str,
) -> Result<Vec<WifiAccessPoint>, ExtractError> {
    if object_json.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: serde_json::Value = serde_json::from_str(object_json)
        .map_err(|e| ExtractError::InvalidJson(e.to_string()))?;

    let Some(raw) = value.get(field) else {
        return Ok(Vec::new());
    };

    let Some(entries) = raw.as_array() else {
        return Err(ExtractError::InvalidShape {
            field: field.to_string(),
            reason: "expected a list".to_string(),
        });
    };

    entries
        .iter()
        .map(|entry| parse_access_point(entry, field))
        .collect()
}

fn parse_access_point(
    entry: &serde_json::Value,
    field: &str,
) -> Result<WifiAccessPoint, ExtractError> {
    let mac_b64 = entry
        .get("macAddress")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ExtractError::InvalidShape {
            field: field.to_string(),
            reason: "entry missing string macAddress".to_string(),
        })?;

    let mac_bytes = base64::engine::general_purpose::STANDARD
        .decode(mac_b64)
        .map_err(|e| ExtractError::InvalidBase64 {
            field: field.to_string(),
            reason: e.to_string(),
        })?;

    let mac_address: [u8; 6] = mac_bytes
        .try_into()
        .map_err(|_| ExtractError::InvalidShape {
            field: field.to_string(),
            reason: "macAddress must decode to 6 bytes".to_string(),
        })?;

    let signal_strength = entry
        .get("signalStrength")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| ExtractError::InvalidShape {
            field: field.to_string(),
            reason: "entry missing numeric signalStrength".to_string(),
        })? as i32;

    Ok(WifiAccessPoint {
        mac_address,
        signal_strength,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gnss_empty_json_returns_empty_blob() {
        assert_eq!(gnss_payload("", "lr1110_gnss").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn gnss_missing_field_returns_empty_blob() {
        let json = r#"{"other":"value"}"#;
        assert_eq!(gnss_payload(json, "lr1110_gnss").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn gnss_decodes_base64_field() {
        let json = r#"{"lr1110_gnss":"AQID"}"#;
        assert_eq!(gnss_payload(json, "lr1110_gnss").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn gnss_type_mismatch_is_an_error() {
        let json = r#"{"lr1110_gnss": 42}"#;
        let err = gnss_payload(json, "lr1110_gnss").unwrap_err();
        assert_eq!(
            err,
            ExtractError::TypeMismatch {
                field: "lr1110_gnss".to_string()
            }
        );
    }

    #[test]
    fn gnss_bad_base64_is_surfaced() {
        let json = r#"{"lr1110_gnss":"not-base64!!"}"#;
        assert!(matches!(
            gnss_payload(json, "lr1110_gnss"),
            Err(ExtractError::InvalidBase64 { .. })
        ));
    }

    #[test]
    fn wifi_missing_field_returns_empty_list() {
        assert_eq!(wifi_access_points(r#"{}"#, "wifi_aps").unwrap(), vec![]);
    }

    #[test]
    fn wifi_parses_access_points_in_order() {
        let json = r#"{"wifi_aps":[
            {"macAddress":"AQEBAQEB","signalStrength":-10},
            {"macAddress":"AgICAgIC","signalStrength":-20}
        ]}"#;
        let aps = wifi_access_points(json, "wifi_aps").unwrap();
        assert_eq!(aps.len(), 2);
        assert_eq!(aps[0].mac_address, [1, 1, 1, 1, 1, 1]);
        assert_eq!(aps[0].signal_strength, -10);
        assert_eq!(aps[1].mac_address, [2, 2, 2, 2, 2, 2]);
        assert_eq!(aps[1].signal_strength, -20);
    }

    #[test]
    fn wifi_structural_mismatch_is_an_error() {
        let json = r#"{"wifi_aps":[{"macAddress":"AQEBAQEB"}]}"#;
        assert!(matches!(
            wifi_access_points(json, "wifi_aps"),
            Err(ExtractError::InvalidShape { .. })
        ));
    }

    #[test]
    fn wifi_non_list_field_is_an_error() {
        let json = r#"{"wifi_aps":"oops"}"#;
        assert!(matches!(
            wifi_access_points(json, "wifi_aps"),
            Err(ExtractError::InvalidShape { .. })
        ));
    }
}
