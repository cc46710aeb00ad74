//! Integration facade — spec.md §4.1.
//!
//! Implements the event-handler contract the dispatcher calls into.
//! `HandleUplinkEvent` is the only handler with real behavior; the rest
//! are accepted and answered with success, matching the host
//! application server's convention that an integration only opts into
//! the event kinds it cares about.

use crate::buffer::BufferStore;
pub use crate::context::CorrelationContext;
use crate::error::GeolocError;
use crate::model::{LocationEvent, UplinkEvent};
use crate::orchestrator;
use crate::resolver::ResolverClient;
use crate::Config;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Opaque string map passed through untouched (spec.md §4.1 `Vars`).
pub type Vars = HashMap<String, String>;

/// Sink the facade calls back into for derived events. Mirrors the
/// dispatcher's own outbound contract (spec.md §6): sink errors are
/// logged, never propagated.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn handle_location_event(
        &self,
        ctx: &CorrelationContext,
        vars: &Vars,
        event: LocationEvent,
    ) -> anyhow::Result<()>;
}

/// The geolocation integration, wired with its two external
/// collaborators (spec.md §4.2a, §4.6a).
pub struct GeolocationIntegration {
    config: Config,
    buffer: Arc<dyn BufferStore>,
    resolver: Arc<dyn ResolverClient>,
}

impl GeolocationIntegration {
    pub fn new(config: Config, buffer: Arc<dyn BufferStore>, resolver: Arc<dyn ResolverClient>) -> Self {
        Self { config, buffer, resolver }
    }

    /// The only handler with real behavior (spec.md §4.1).
    pub async fn handle_uplink_event(
        &self,
        ctx: &CorrelationContext,
        sink: &dyn EventSink,
        vars: &Vars,
        uplink: UplinkEvent,
    ) -> Result<(), GeolocError> {
        if !self.config.geolocation {
            return Ok(());
        }

        if ctx.is_cancelled() {
            tracing::warn!(device = %uplink.dev_eui, "uplink handling canceled before any I/O started");
            return Err(GeolocError::Cancelled);
        }

        let ttl = Duration::from_secs(self.config.geolocation_buffer_ttl);
        let buffer = crate::buffer::update(
            ctx,
            self.buffer.as_ref(),
            uplink.dev_eui,
            &uplink.rx_info,
            ttl,
        )
        .await?;

        let event =
            orchestrator::resolve(ctx, &self.config, self.resolver.as_ref(), &uplink, &buffer)
                .await?;

        if let Some(event) = event {
            if let Err(e) = sink.handle_location_event(ctx, vars, event).await {
                tracing::warn!(device = %uplink.dev_eui, error = %e, "location event sink failed, dropping");
            }
        }

        Ok(())
    }

    pub async fn handle_join_event(&self, _ctx: &CorrelationContext, _vars: &Vars) -> Result<(), GeolocError> {
        Ok(())
    }

    pub async fn handle_ack_event(&self, _ctx: &CorrelationContext, _vars: &Vars) -> Result<(), GeolocError> {
        Ok(())
    }

    pub async fn handle_error_event(&self, _ctx: &CorrelationContext, _vars: &Vars) -> Result<(), GeolocError> {
        Ok(())
    }

    pub async fn handle_status_event(&self, _ctx: &CorrelationContext, _vars: &Vars) -> Result<(), GeolocError> {
        Ok(())
    }

    pub async fn handle_location_event(&self, _ctx: &CorrelationContext, _vars: &Vars) -> Result<(), GeolocError> {
        Ok(())
    }

    pub async fn handle_tx_ack_event(&self, _ctx: &CorrelationContext, _vars: &Vars) -> Result<(), GeolocError> {
        Ok(())
    }

    pub async fn close(&self) -> Result<(), GeolocError> {
        Ok(())
    }

    /// This integration never sends downlinks.
    pub fn downlink_channel(&self) -> Option<()> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::InMemoryBufferStore;
    use crate::model::{AntennaLocation, DeviceId, UplinkReception};
    use crate::resolver::types::{
        GnssLr1110SingleFrameRequest, RssiMultiFrameRequest, RssiSingleFrameRequest,
        ResolvedFix, ResolverOutcome, TdoaMultiFrameRequest, TdoaSingleFrameRequest,
        WifiTdoaSingleFrameRequest,
    };
    use std::sync::Mutex;

    struct AlwaysFixResolver;

    #[async_trait]
    impl ResolverClient for AlwaysFixResolver {
        async fn tdoa_single(
            &self,
            _ctx: &CorrelationContext,
            _req: TdoaSingleFrameRequest,
        ) -> Result<ResolverOutcome, GeolocError> {
            Ok(fix())
        }
        async fn tdoa_multi(
            &self,
            _ctx: &CorrelationContext,
            _req: TdoaMultiFrameRequest,
        ) -> Result<ResolverOutcome, GeolocError> {
            Ok(fix())
        }
        async fn rssi_single(
            &self,
            _ctx: &CorrelationContext,
            _req: RssiSingleFrameRequest,
        ) -> Result<ResolverOutcome, GeolocError> {
            Ok(fix())
        }
        async fn rssi_multi(
            &self,
            _ctx: &CorrelationContext,
            _req: RssiMultiFrameRequest,
        ) -> Result<ResolverOutcome, GeolocError> {
            Ok(fix())
        }
        async fn wifi_tdoa(
            &self,
            _ctx: &CorrelationContext,
            _req: WifiTdoaSingleFrameRequest,
        ) -> Result<ResolverOutcome, GeolocError> {
            Ok(fix())
        }
        async fn gnss_lr1110(
            &self,
            _ctx: &CorrelationContext,
            _req: GnssLr1110SingleFrameRequest,
        ) -> Result<ResolverOutcome, GeolocError> {
            Ok(fix())
        }
    }

    fn fix() -> ResolverOutcome {
        ResolverOutcome::Fix(ResolvedFix {
            latitude: 1.123,
            longitude: 2.123,
            altitude: 3.333,
            accuracy: 10.0,
        })
    }

    #[derive(Default)]
    struct RecordingSink {
        received: Mutex<Vec<LocationEvent>>,
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn handle_location_event(
            &self,
            _ctx: &CorrelationContext,
            _vars: &Vars,
            event: LocationEvent,
        ) -> anyhow::Result<()> {
            self.received.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn uplink() -> UplinkEvent {
        UplinkEvent {
            application_id: 1,
            application_name: "test-app".to_string(),
            device_name: "test-device".to_string(),
            dev_eui: DeviceId([1, 2, 3, 4, 5, 6, 7, 8]),
            f_cnt: 1,
            rx_info: vec![
                reception(1, 111),
                reception(2, 222),
                reception(3, 333),
            ],
            object_json: String::new(),
            tags: Default::default(),
        }
    }

    fn reception(id: u8, ts: u64) -> UplinkReception {
        UplinkReception {
            gateway_id: [id; 8],
            uplink_id: vec![id],
            rssi: id as i32,
            snr: id as f64 + 0.1,
            antenna_location: AntennaLocation {
                latitude: 1.111,
                longitude: 2.222,
                altitude: 3.333,
            },
            fine_timestamp: Some(ts),
        }
    }

    #[tokio::test]
    async fn disabled_geolocation_is_inert_s1() {
        let config = Config {
            geolocation: false,
            ..Config::default()
        };
        let integration = GeolocationIntegration::new(
            config,
            Arc::new(InMemoryBufferStore::new()),
            Arc::new(AlwaysFixResolver),
        );
        let sink = RecordingSink::default();

        integration
            .handle_uplink_event(&CorrelationContext::new(), &sink, &Vars::new(), uplink())
            .await
            .unwrap();

        assert!(sink.received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn enabled_tdoa_emits_a_location_event() {
        let config = Config {
            geolocation: true,
            geolocation_tdoa: true,
            ..Config::default()
        };
        let integration = GeolocationIntegration::new(
            config,
            Arc::new(InMemoryBufferStore::new()),
            Arc::new(AlwaysFixResolver),
        );
        let sink = RecordingSink::default();

        integration
            .handle_uplink_event(&CorrelationContext::new(), &sink, &Vars::new(), uplink())
            .await
            .unwrap();

        let received = sink.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].uplink_ids, vec![vec![1], vec![2], vec![3]]);
    }
}
