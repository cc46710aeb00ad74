//! Correlation context — spec.md §4.1, §5; SPEC_FULL.md §3.
//!
//! Carries the request-scoped id and the cancellation signal the
//! dispatcher uses to abort in-flight buffer/resolver I/O. The real
//! dispatcher's context type is an external collaborator (spec.md §1);
//! this is the lightweight `CancellationToken`/`Deadline` substitute
//! SPEC_FULL.md §3 calls for, built on a shared flag plus a
//! `tokio::sync::Notify` so every clone of a context observes the same
//! cancellation.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::Instant as TokioInstant;

#[derive(Debug, Clone)]
pub struct CorrelationContext {
    id: uuid::Uuid,
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
    deadline: Option<TokioInstant>,
}

impl CorrelationContext {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
            deadline: None,
        }
    }

    /// A context that cancels itself once `deadline` passes, without
    /// anyone calling `cancel()` explicitly.
    pub fn with_deadline(deadline: TokioInstant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::new()
        }
    }

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    /// True once `cancel()` has been called on this context or any of
    /// its clones, or once the configured deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst) || self.past_deadline()
    }

    fn past_deadline(&self) -> bool {
        self.deadline.is_some_and(|d| TokioInstant::now() >= d)
    }

    /// Cancels this context and every clone of it, waking anything
    /// currently blocked in [`CorrelationContext::race`].
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Runs `fut` to completion, or drops it and returns `None` as soon
    /// as this context is (or becomes) canceled — the mechanism by
    /// which buffer and resolver I/O honor cancellation (spec.md §5:
    /// "a canceled context aborts in progress I/O").
    pub async fn race<F, T>(&self, fut: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        if self.is_cancelled() {
            return None;
        }
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.notify.notified() => None,
                    _ = tokio::time::sleep_until(deadline) => None,
                    out = fut => Some(out),
                }
            }
            None => {
                tokio::select! {
                    biased;
                    _ = self.notify.notified() => None,
                    out = fut => Some(out),
                }
            }
        }
    }
}

impl Default for CorrelationContext {
    fn default() -> Self {
        Self::new()
    }
}
