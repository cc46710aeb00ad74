//! Resolver client — spec.md §4.6.
//!
//! Composes the base URI with a per-endpoint path, serializes the typed
//! request as JSON, attaches the bearer token, POSTs, and interprets the
//! response as either a fix or the `NoLocation` sentinel. Non-2xx
//! responses surface as `GeolocError::Resolver`. Every call races
//! against `ctx`'s cancellation so a canceled context aborts an
//! in-flight request rather than waiting it out (spec.md §5).

pub mod types;

use crate::context::CorrelationContext;
use crate::error::GeolocError;
use crate::metrics;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Instant;
pub use types::{
    GnssLr1110SingleFrameRequest, RssiMultiFrameRequest, RssiSingleFrameRequest, ResolvedFix,
    ResolverOutcome, TdoaMultiFrameRequest, TdoaSingleFrameRequest, WifiTdoaSingleFrameRequest,
};
use types::{GnssResponseBody, ResolverResponseBody};

/// Typed surface to the external geolocation resolver — spec.md §4.6a.
#[async_trait]
pub trait ResolverClient: Send + Sync {
    async fn tdoa_single(
        &self,
        ctx: &CorrelationContext,
        req: TdoaSingleFrameRequest,
    ) -> Result<ResolverOutcome, GeolocError>;

    async fn tdoa_multi(
        &self,
        ctx: &CorrelationContext,
        req: TdoaMultiFrameRequest,
    ) -> Result<ResolverOutcome, GeolocError>;

    async fn rssi_single(
        &self,
        ctx: &CorrelationContext,
        req: RssiSingleFrameRequest,
    ) -> Result<ResolverOutcome, GeolocError>;

    async fn rssi_multi(
        &self,
        ctx: &CorrelationContext,
        req: RssiMultiFrameRequest,
    ) -> Result<ResolverOutcome, GeolocError>;

    async fn wifi_tdoa(
        &self,
        ctx: &CorrelationContext,
        req: WifiTdoaSingleFrameRequest,
    ) -> Result<ResolverOutcome, GeolocError>;

    async fn gnss_lr1110(
        &self,
        ctx: &CorrelationContext,
        req: GnssLr1110SingleFrameRequest,
    ) -> Result<ResolverOutcome, GeolocError>;
}

/// Production `ResolverClient` backed by `reqwest`.
pub struct HttpResolverClient {
    http: Client,
    base_url: String,
    token: String,
}

impl HttpResolverClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    async fn post<Req: Serialize + Send + Sync>(
        &self,
        ctx: &CorrelationContext,
        path: &str,
        endpoint_label: &str,
        body: &Req,
    ) -> Result<serde_json::Value, GeolocError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let start = Instant::now();

        let send = self.http.post(&url).bearer_auth(&self.token).json(body).send();
        let Some(sent) = ctx.race(send).await else {
            tracing::error!(%url, "resolver request canceled before completion");
            return Err(GeolocError::Cancelled);
        };
        let response = sent.map_err(|e| {
            tracing::error!(%url, error = %e, "resolver request failed");
            GeolocError::Resolver(format!("request to {} failed: {}", url, e))
        })?;

        metrics::observe_request_duration(endpoint_label, start.elapsed());

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(%url, %status, body = %text, "resolver returned a non-success status");
            return Err(GeolocError::Resolver(format!(
                "{} returned {}: {}",
                url, status, text
            )));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| {
                tracing::error!(%url, error = %e, "resolver response was not valid json");
                GeolocError::Resolver(format!("invalid response from {}: {}", url, e))
            })
    }
}

#[async_trait]
impl ResolverClient for HttpResolverClient {
    async fn tdoa_single(
        &self,
        ctx: &CorrelationContext,
        req: TdoaSingleFrameRequest,
    ) -> Result<ResolverOutcome, GeolocError> {
        let value = self
            .post(ctx, "/api/v2/tdoa", metrics::LABEL_TDOA_SINGLE, &req)
            .await?;
        parse_location_body(value)
    }

    async fn tdoa_multi(
        &self,
        ctx: &CorrelationContext,
        req: TdoaMultiFrameRequest,
    ) -> Result<ResolverOutcome, GeolocError> {
        let value = self
            .post(
                ctx,
                "/api/v2/tdoa/multiframe",
                metrics::LABEL_TDOA_MULTI,
                &req,
            )
            .await?;
        parse_location_body(value)
    }

    async fn rssi_single(
        &self,
        ctx: &CorrelationContext,
        req: RssiSingleFrameRequest,
    ) -> Result<ResolverOutcome, GeolocError> {
        let value = self
            .post(ctx, "/api/v2/rssi", metrics::LABEL_RSSI_SINGLE, &req)
            .await?;
        parse_location_body(value)
    }

    async fn rssi_multi(
        &self,
        ctx: &CorrelationContext,
        req: RssiMultiFrameRequest,
    ) -> Result<ResolverOutcome, GeolocError> {
        let value = self
            .post(
                ctx,
                "/api/v2/rssi/multiframe",
                metrics::LABEL_RSSI_MULTI,
                &req,
            )
            .await?;
        parse_location_body(value)
    }

    async fn wifi_tdoa(
        &self,
        ctx: &CorrelationContext,
        req: WifiTdoaSingleFrameRequest,
    ) -> Result<ResolverOutcome, GeolocError> {
        let value = self
            .post(
                ctx,
                "/api/v2/tdoawifi",
                metrics::LABEL_WIFI_TDOA_SINGLE,
                &req,
            )
            .await?;
        parse_location_body(value)
    }

    async fn gnss_lr1110(
        &self,
        ctx: &CorrelationContext,
        req: GnssLr1110SingleFrameRequest,
    ) -> Result<ResolverOutcome, GeolocError> {
        let value = self
            .post(
                ctx,
                "/api/v3/solve/gnss_lr1110_singleframe",
                metrics::LABEL_GNSS_LR1110_SINGLE,
                &req,
            )
            .await?;
        let body: GnssResponseBody = serde_json::from_value(value)
            .map_err(|e| GeolocError::Resolver(format!("malformed GNSS response: {}", e)))?;
        Ok(ResolverOutcome::from(body))
    }
}

fn parse_location_body(value: serde_json::Value) -> Result<ResolverOutcome, GeolocError> {
    let body: ResolverResponseBody = serde_json::from_value(value)
        .map_err(|e| GeolocError::Resolver(format!("malformed resolver response: {}", e)))?;
    Ok(ResolverOutcome::from(body))
}
