//! In-memory `BufferStore` — suitable for the demo binary and tests.
//!
//! Generalizes the host crate's `GatewayTracker`: a single
//! `tokio::sync::RwLock` guarding a shared map, written from whatever
//! concurrent task handles a given uplink (spec.md §5 — concurrent
//! uplinks for the same device may interleave; last-writer-wins is
//! acceptable because a dropped buffered frame only reduces accuracy).
//! Every operation races against `ctx`'s cancellation signal so a
//! canceled context aborts in-progress reads/writes (spec.md §5).

use super::BufferStore;
use crate::context::CorrelationContext;
use crate::error::GeolocError;
use crate::model::{DeviceId, Frame};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Entry {
    frames: Vec<Frame>,
    expires_at: Instant,
}

#[derive(Default)]
pub struct InMemoryBufferStore {
    inner: RwLock<HashMap<DeviceId, Entry>>,
}

impl InMemoryBufferStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BufferStore for InMemoryBufferStore {
    async fn get(
        &self,
        ctx: &CorrelationContext,
        device: DeviceId,
        ttl: Duration,
    ) -> Result<Vec<Frame>, GeolocError> {
        // A zero TTL means the buffer is single-frame only: no prior
        // write is ever still "current" (spec.md §3 Config notes).
        if ttl.is_zero() {
            return Ok(Vec::new());
        }

        let Some(guard) = ctx.race(self.inner.read()).await else {
            tracing::error!(%device, "buffer read canceled");
            return Err(GeolocError::Cancelled);
        };

        match guard.get(&device) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(entry.frames.clone()),
            _ => Ok(Vec::new()),
        }
    }

    async fn save(
        &self,
        ctx: &CorrelationContext,
        device: DeviceId,
        frames: Vec<Frame>,
        ttl: Duration,
    ) -> Result<(), GeolocError> {
        if frames.is_empty() {
            return Ok(());
        }

        let Some(mut guard) = ctx.race(self.inner.write()).await else {
            tracing::error!(%device, "buffer write canceled");
            return Err(GeolocError::Cancelled);
        };

        guard.insert(
            device,
            Entry {
                frames,
                expires_at: Instant::now() + ttl.max(Duration::from_millis(1)),
            },
        );
        Ok(())
    }

    async fn clear(&self, ctx: &CorrelationContext, device: DeviceId) -> Result<(), GeolocError> {
        let Some(mut guard) = ctx.race(self.inner.write()).await else {
            tracing::error!(%device, "buffer clear canceled");
            return Err(GeolocError::Cancelled);
        };
        guard.remove(&device);
        Ok(())
    }
}
