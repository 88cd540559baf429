//! The cooperative scheduling boundary.

use async_trait::async_trait;

use crate::directive::Suspend;

/// Receives every value the engine does not consume itself and decides
/// real-time pacing.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Suspends the current dispatch until the scheduler resumes it.
    async fn suspend(&self, step: Suspend);
}

/// Scheduler backed by the tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn suspend(&self, step: Suspend) {
        match step {
            Suspend::Wait(duration) => tokio::time::sleep(duration).await,
            Suspend::Frame | Suspend::Show | Suspend::Value(_) => tokio::task::yield_now().await,
        }
    }
}
