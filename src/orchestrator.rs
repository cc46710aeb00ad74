//! Resolver orchestrator — spec.md §4.5, the core of this crate.
//!
//! Strategy selection is split from dispatch, per the redesign note in
//! spec.md §9: a pure [`select_strategy`] produces a tagged [`Strategy`],
//! and [`resolve`] dispatches on it to shape a request, call the
//! resolver, and interpret the response. Priority is GNSS, then WiFi,
//! then TDOA, then RSSI; the first strategy that qualifies is the only
//! one attempted — a `NoLocation` outcome from it is final, never a
//! fallthrough to the next.

use crate::context::CorrelationContext;
use crate::error::GeolocError;
use crate::extract;
use crate::filters::filter_on_fine_timestamp;
use crate::model::{
    DeviceId, Frame, Location, LocationEvent, LocationSource, UplinkEvent, WifiAccessPoint,
    MIN_FRAME_SIZE,
};
use crate::resolver::types::{
    GnssLr1110SingleFrameRequest, RssiMultiFrameRequest, RssiSingleFrameRequest, ResolverOutcome,
    TdoaMultiFrameRequest, TdoaSingleFrameRequest, UplinkRssi, UplinkTdoa, WifiApRequest,
    WifiTdoaSingleFrameRequest,
};
use crate::resolver::ResolverClient;
use crate::Config;

/// Which strategy an uplink qualifies for — spec.md §9 redesign note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Gnss,
    Wifi,
    Tdoa,
    Rssi,
    None,
}

/// Pure selector: GNSS > WiFi > TDOA > RSSI, first qualifier wins
/// (spec.md §4.5, §8 property 2).
pub fn select_strategy(
    config: &Config,
    buffer: &[Frame],
    gnss_blob: &[u8],
    wifi_aps: &[WifiAccessPoint],
) -> Strategy {
    if config.geolocation_gnss && !gnss_blob.is_empty() {
        return Strategy::Gnss;
    }
    if config.geolocation_wifi && !wifi_aps.is_empty() {
        return Strategy::Wifi;
    }
    if config.geolocation_tdoa {
        let filtered = filter_on_fine_timestamp(buffer, MIN_FRAME_SIZE);
        if filtered.len() >= config.effective_min_buffer_size() {
            return Strategy::Tdoa;
        }
    }
    if config.geolocation_rssi && buffer.len() >= config.effective_min_buffer_size() {
        return Strategy::Rssi;
    }
    Strategy::None
}

fn extract_gnss_blob(config: &Config, device: DeviceId, object_json: &str) -> Vec<u8> {
    if !config.geolocation_gnss {
        return Vec::new();
    }
    match extract::gnss_payload(object_json, &config.geolocation_gnss_payload_field) {
        Ok(blob) => blob,
        Err(e) => {
            tracing::warn!(
                %device,
                field = %config.geolocation_gnss_payload_field,
                error = %e,
                "gnss payload extraction failed, treating as absent"
            );
            Vec::new()
        }
    }
}

fn extract_wifi_aps(config: &Config, device: DeviceId, object_json: &str) -> Vec<WifiAccessPoint> {
    if !config.geolocation_wifi {
        return Vec::new();
    }
    match extract::wifi_access_points(object_json, &config.geolocation_wifi_payload_field) {
        Ok(aps) => aps,
        Err(e) => {
            tracing::warn!(
                %device,
                field = %config.geolocation_wifi_payload_field,
                error = %e,
                "wifi access point extraction failed, treating as absent"
            );
            Vec::new()
        }
    }
}

fn flatten_uplink_ids(frames: &[Frame]) -> Vec<Vec<u8>> {
    frames
        .iter()
        .flat_map(|frame| frame.iter().map(|rx| rx.uplink_id.clone()))
        .collect()
}

/// Run strategy selection and, if a strategy qualifies, call the
/// resolver and translate its outcome into a [`LocationEvent`].
///
/// `buffer` is the device's buffer *after* `crate::buffer::update` has
/// run for this uplink — i.e. it already includes the current frame if
/// the current frame was long enough to be buffered at all.
pub async fn resolve(
    ctx: &CorrelationContext,
    config: &Config,
    resolver: &dyn ResolverClient,
    uplink: &UplinkEvent,
    buffer: &[Frame],
) -> Result<Option<LocationEvent>, GeolocError> {
    let gnss_blob = extract_gnss_blob(config, uplink.dev_eui, &uplink.object_json);
    let wifi_aps = extract_wifi_aps(config, uplink.dev_eui, &uplink.object_json);

    match select_strategy(config, buffer, &gnss_blob, &wifi_aps) {
        Strategy::Gnss => resolve_gnss(ctx, config, resolver, uplink, &gnss_blob).await,
        Strategy::Wifi => resolve_wifi(ctx, resolver, uplink, &wifi_aps).await,
        Strategy::Tdoa => resolve_tdoa(ctx, resolver, uplink, buffer).await,
        Strategy::Rssi => resolve_rssi(ctx, resolver, uplink, buffer).await,
        Strategy::None => Ok(None),
    }
}

async fn resolve_gnss(
    ctx: &CorrelationContext,
    config: &Config,
    resolver: &dyn ResolverClient,
    uplink: &UplinkEvent,
    gnss_blob: &[u8],
) -> Result<Option<LocationEvent>, GeolocError> {
    // Assist position comes from the current uplink's first reception
    // (spec.md §4.5). Without one there is nothing to assist with; this
    // is treated the same as GNSS never qualifying.
    let Some(first) = uplink.rx_info.first() else {
        tracing::warn!(device = %uplink.dev_eui, "gnss qualified but uplink carries no receptions");
        return Ok(None);
    };

    let gnss_capture_time = if config.geolocation_gnss_use_rx_time {
        Some(chrono::Utc::now().timestamp())
    } else {
        None
    };

    let request = GnssLr1110SingleFrameRequest {
        payload: hex::encode(gnss_blob),
        gnss_assist_position: [first.antenna_location.latitude, first.antenna_location.longitude],
        gnss_assist_altitude: first.antenna_location.altitude,
        gnss_capture_time,
    };

    let outcome = resolver.gnss_lr1110(ctx, request).await?;
    Ok(outcome_to_event(outcome, uplink, LocationSource::Gnss, Vec::new(), Some(uplink.f_cnt)))
}

async fn resolve_wifi(
    ctx: &CorrelationContext,
    resolver: &dyn ResolverClient,
    uplink: &UplinkEvent,
    wifi_aps: &[WifiAccessPoint],
) -> Result<Option<LocationEvent>, GeolocError> {
    // `toa` is always zero here, even for receptions with a fine
    // timestamp — spec.md §9 Open Question (a), preserved intentionally.
    let lorawan: Vec<UplinkTdoa> = uplink
        .rx_info
        .iter()
        .map(|rx| UplinkTdoa::from_reception(rx, 0))
        .collect();
    let wifi_access_points: Vec<WifiApRequest> = wifi_aps.iter().map(WifiApRequest::from).collect();

    let request = WifiTdoaSingleFrameRequest {
        lorawan,
        wifi_access_points,
    };

    let outcome = resolver.wifi_tdoa(ctx, request).await?;
    Ok(outcome_to_event(outcome, uplink, LocationSource::Wifi, Vec::new(), Some(uplink.f_cnt)))
}

async fn resolve_tdoa(
    ctx: &CorrelationContext,
    resolver: &dyn ResolverClient,
    uplink: &UplinkEvent,
    buffer: &[Frame],
) -> Result<Option<LocationEvent>, GeolocError> {
    let filtered = filter_on_fine_timestamp(buffer, MIN_FRAME_SIZE);
    let uplink_ids = flatten_uplink_ids(&filtered);

    let outcome = if filtered.len() == 1 {
        let lorawan: Vec<UplinkTdoa> = filtered[0]
            .iter()
            .map(|rx| UplinkTdoa::from_reception(rx, rx.fine_timestamp.unwrap_or(0)))
            .collect();
        resolver.tdoa_single(ctx, TdoaSingleFrameRequest { lorawan }).await?
    } else {
        let lorawan: Vec<Vec<UplinkTdoa>> = filtered
            .iter()
            .map(|frame| {
                frame
                    .iter()
                    .map(|rx| UplinkTdoa::from_reception(rx, rx.fine_timestamp.unwrap_or(0)))
                    .collect()
            })
            .collect();
        resolver.tdoa_multi(ctx, TdoaMultiFrameRequest { lorawan }).await?
    };

    Ok(outcome_to_event(outcome, uplink, LocationSource::Tdoa, uplink_ids, None))
}

async fn resolve_rssi(
    ctx: &CorrelationContext,
    resolver: &dyn ResolverClient,
    uplink: &UplinkEvent,
    buffer: &[Frame],
) -> Result<Option<LocationEvent>, GeolocError> {
    let uplink_ids = flatten_uplink_ids(buffer);

    let outcome = if buffer.len() == 1 {
        let lorawan: Vec<UplinkRssi> = buffer[0].iter().map(UplinkRssi::from_reception).collect();
        resolver.rssi_single(ctx, RssiSingleFrameRequest { lorawan }).await?
    } else {
        let lorawan: Vec<Vec<UplinkRssi>> = buffer
            .iter()
            .map(|frame| frame.iter().map(UplinkRssi::from_reception).collect())
            .collect();
        resolver.rssi_multi(ctx, RssiMultiFrameRequest { lorawan }).await?
    };

    Ok(outcome_to_event(outcome, uplink, LocationSource::Rssi, uplink_ids, None))
}

fn outcome_to_event(
    outcome: ResolverOutcome,
    uplink: &UplinkEvent,
    source: LocationSource,
    uplink_ids: Vec<Vec<u8>>,
    f_cnt: Option<u32>,
) -> Option<LocationEvent> {
    let fix = match outcome {
        ResolverOutcome::Fix(fix) => fix,
        ResolverOutcome::NoLocation => return None,
    };

    Some(LocationEvent {
        application_id: uplink.application_id,
        application_name: uplink.application_name.clone(),
        device_name: uplink.device_name.clone(),
        dev_eui: uplink.dev_eui,
        tags: uplink.tags.clone(),
        uplink_ids,
        f_cnt,
        location: Location {
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude: fix.altitude,
            accuracy: fix.accuracy,
            source,
        },
    })
}
