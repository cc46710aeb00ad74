//! Configuration surface — spec.md §3 "Config" and §6.
//!
//! Captured at facade construction and read-only for its lifetime
//! (spec.md §3 "Lifecycle"). Unknown TOML keys are ignored, matching the
//! host application server's own tolerant config loading.

use serde::Deserialize;
use std::path::Path;

/// Default resolver base URI (spec.md §6, §9 "HTTP test seam").
pub const DEFAULT_GEOLOCATION_SERVER: &str = "https://gls.loracloud.com";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Master enable. When false, `HandleUplinkEvent` is a no-op: no
    /// buffer I/O, no resolver I/O (spec.md §8 property 7).
    pub geolocation: bool,
    /// Base URI of the resolver HTTP service.
    pub geolocation_server: String,
    /// Bearer token sent to the resolver.
    pub geolocation_token: String,
    /// Buffer TTL in seconds. Zero means the buffer behaves as
    /// single-frame only (each write replaces the prior state once it
    /// expires essentially immediately).
    pub geolocation_buffer_ttl: u64,
    /// Minimum frame count required for buffered TDOA/RSSI attempts.
    pub geolocation_min_buffer_size: usize,
    pub geolocation_tdoa: bool,
    pub geolocation_rssi: bool,
    pub geolocation_gnss: bool,
    /// Object-JSON field name carrying the base64 GNSS blob.
    pub geolocation_gnss_payload_field: String,
    pub geolocation_gnss_use_rx_time: bool,
    pub geolocation_wifi: bool,
    /// Object-JSON field name carrying the WiFi access-point list.
    pub geolocation_wifi_payload_field: String,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {:?}: {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("failed to parse config file: {}", e))?;
        Ok(config)
    }

    /// Effective minimum buffer size for TDOA/RSSI gating — spec.md §4.5
    /// clamps the configured value to at least 1.
    pub fn effective_min_buffer_size(&self) -> usize {
        self.geolocation_min_buffer_size.max(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geolocation: false,
            geolocation_server: DEFAULT_GEOLOCATION_SERVER.to_string(),
            geolocation_token: String::new(),
            geolocation_buffer_ttl: 0,
            geolocation_min_buffer_size: 1,
            geolocation_tdoa: false,
            geolocation_rssi: false,
            geolocation_gnss: false,
            geolocation_gnss_payload_field: String::new(),
            geolocation_gnss_use_rx_time: false,
            geolocation_wifi: false,
            geolocation_wifi_payload_field: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_inert() {
        let config = Config::default();
        assert!(!config.geolocation);
        assert_eq!(config.geolocation_server, DEFAULT_GEOLOCATION_SERVER);
    }

    #[test]
    fn effective_min_buffer_size_is_clamped() {
        let mut config = Config {
            geolocation_min_buffer_size: 0,
            ..Config::default()
        };
        assert_eq!(config.effective_min_buffer_size(), 1);
        config.geolocation_min_buffer_size = 5;
        assert_eq!(config.effective_min_buffer_size(), 5);
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let toml_str = r#"
            geolocation = true
            geolocation_tdoa = true
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.geolocation);
        assert!(config.geolocation_tdoa);
        assert!(!config.geolocation_rssi);
        assert_eq!(config.geolocation_server, DEFAULT_GEOLOCATION_SERVER);
    }
}
