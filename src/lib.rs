//! LoRaWAN egress geolocation integration.
//!
//! Turns uplink radio metadata into a location fix via an external
//! geolocation resolver and emits a [`model::LocationEvent`] back into
//! the host integration bus. See [`facade::GeolocationIntegration`] for
//! the entry point.

pub mod buffer;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod facade;
pub mod filters;
pub mod metrics;
pub mod model;
pub mod orchestrator;
pub mod resolver;

pub use config::Config;
pub use context::CorrelationContext;
pub use error::GeolocError;
pub use facade::{EventSink, GeolocationIntegration, Vars};
pub use model::{Location, LocationEvent, LocationSource, UplinkEvent};
