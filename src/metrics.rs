//! Resolver call duration metrics — spec.md §4.6, §9.
//!
//! One histogram, one label per endpoint. Registered once via
//! `once_cell` and observed, in seconds, around every resolver HTTP
//! call. No repo in the reference pack depends on `prometheus` directly
//! — see DESIGN.md's dependency-stack notes for why it's used anyway.

use once_cell::sync::Lazy;
use prometheus::{register_histogram_vec, HistogramVec};

/// Endpoint labels, as enumerated in spec.md §4.6/§9.
pub const LABEL_TDOA_SINGLE: &str = "v2_tdoa_single";
pub const LABEL_TDOA_MULTI: &str = "v2_tdoa_multi";
pub const LABEL_RSSI_SINGLE: &str = "v2_rssi_single";
pub const LABEL_RSSI_MULTI: &str = "v2_rssi_multi";
pub const LABEL_WIFI_TDOA_SINGLE: &str = "v2_wifi_tdoa_single";
pub const LABEL_GNSS_LR1110_SINGLE: &str = "v3_gnss_rl1110_single";

static RESOLVER_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "geoloc_resolver_request_duration_seconds",
        "Duration of geolocation resolver HTTP requests, by endpoint",
        &["endpoint"]
    )
    .expect("geoloc_resolver_request_duration_seconds histogram registers exactly once")
});

/// Record `duration` against `endpoint`'s histogram.
pub fn observe_request_duration(endpoint: &str, duration: std::time::Duration) {
    RESOLVER_REQUEST_DURATION
        .with_label_values(&[endpoint])
        .observe(duration.as_secs_f64());
}
