//! Sleep capability used between attempts.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Something that can suspend the current task for a while.
///
/// The executor never calls `tokio::time::sleep` directly, so tests can
/// substitute a clock that records waits without spending wall-clock time.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Suspend for `duration`. Must yield to the runtime, not block the thread.
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[async_trait]
impl<C: Clock + ?Sized> Clock for Arc<C> {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}
