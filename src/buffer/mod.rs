//! Geolocation buffer — spec.md §3 "GeolocBuffer", §4.2.
//!
//! The per-device rolling window of past frames' reception arrays. The
//! backing store is an external collaborator (spec.md §1, §6): an
//! opaque KV service keyed by device id, supporting atomic
//! get/set-with-TTL. We model it as `BufferStore` and generalize the
//! host crate's `GatewayTracker` (an `Arc<RwLock<..>>` guarded piece of
//! shared state updated from concurrent tasks) into a concrete
//! in-memory implementation for the demo binary and tests.

pub mod memory;

use crate::context::CorrelationContext;
use crate::error::GeolocError;
use crate::model::{DeviceId, Frame, MIN_FRAME_SIZE};
use async_trait::async_trait;
use std::time::Duration;

pub use memory::InMemoryBufferStore;

/// KV binding for a device's buffered frames.
///
/// Implementations MUST preserve receptions byte-for-byte (gateway ids,
/// uplink ids, fine-timestamp nanos) — they flow unchanged into the
/// resolver request (spec.md §6). Implementations MUST also honor
/// `ctx`'s cancellation (spec.md §5): a canceled context should abort
/// in-progress I/O and return [`GeolocError::Cancelled`].
#[async_trait]
pub trait BufferStore: Send + Sync {
    /// Returns the current buffer, or empty if absent or expired. Empty
    /// is not an error. A `ttl` of zero means the buffer behaves as
    /// single-frame-only: no prior state is ever considered current.
    async fn get(
        &self,
        ctx: &CorrelationContext,
        device: DeviceId,
        ttl: Duration,
    ) -> Result<Vec<Frame>, GeolocError>;

    /// Writes the buffer and sets/extends its TTL. Saving an empty
    /// sequence is a no-op — empty state is never persisted.
    async fn save(
        &self,
        ctx: &CorrelationContext,
        device: DeviceId,
        frames: Vec<Frame>,
        ttl: Duration,
    ) -> Result<(), GeolocError>;

    /// Removes any stored buffer for the device.
    async fn clear(&self, ctx: &CorrelationContext, device: DeviceId) -> Result<(), GeolocError>;
}

/// Run the per-uplink buffer update protocol (spec.md §4.2):
///
/// 1. Read the existing buffer under the configured TTL.
/// 2. If `current_frame` has at least [`MIN_FRAME_SIZE`] receptions,
///    append it. Shorter frames are deliberately dropped — they cannot
///    support TDOA or RSSI resolution (spec.md §8 property 1).
/// 3. If the resulting buffer is non-empty, save it (refreshing TTL).
/// 4. Return the updated sequence for the orchestrator to consume.
pub async fn update(
    ctx: &CorrelationContext,
    store: &dyn BufferStore,
    device: DeviceId,
    current_frame: &Frame,
    ttl: Duration,
) -> Result<Vec<Frame>, GeolocError> {
    let mut buffer = store.get(ctx, device, ttl).await.map_err(|e| {
        tracing::error!(%device, error = %e, "buffer read failed");
        e
    })?;

    if current_frame.len() >= MIN_FRAME_SIZE {
        buffer.push(current_frame.clone());
    }

    if !buffer.is_empty() {
        store.save(ctx, device, buffer.clone(), ttl).await.map_err(|e| {
            tracing::error!(%device, error = %e, "buffer write failed");
            e
        })?;
    }

    Ok(buffer)
}
