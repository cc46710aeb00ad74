//! Error taxonomy for the geolocation integration.
//!
//! See spec.md §7 — `ConfigError` never appears as a runtime value
//! (misconfiguration is represented by "no strategy qualifies") and
//! `NoLocation` is a sentinel outcome, not an error, so neither has a
//! variant here.

use crate::model::DeviceId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeolocError {
    /// The buffer's backing KV store failed a get/save. Propagated to
    /// the dispatcher with context; the orchestrator is never invoked.
    #[error("buffer store error for device {device}: {reason}")]
    Buffer { device: DeviceId, reason: String },

    /// The object-JSON field failed to decode (bad JSON, type mismatch,
    /// or base64 failure). Logged and treated as "no extractable input";
    /// never surfaced to the dispatcher as an uplink error.
    #[error("failed to extract field {field:?} for device {device}: {reason}")]
    Extract {
        device: DeviceId,
        field: String,
        reason: String,
    },

    /// Resolver transport, serialization, or non-2xx response.
    /// Propagated to the dispatcher.
    #[error("resolver error: {0}")]
    Resolver(String),

    /// The correlation context was canceled while buffer or resolver I/O
    /// was in flight (spec.md §5). Propagated to the dispatcher; no
    /// partial `LocationEvent` is ever emitted for a canceled uplink.
    #[error("operation canceled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, GeolocError>;
