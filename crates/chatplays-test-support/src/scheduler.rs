//! Test scheduler: records suspensions without sleeping.

use std::sync::Mutex;

use async_trait::async_trait;
use chatplays_core::directive::Suspend;
use chatplays_core::scheduler::Scheduler;

/// A scheduler that records every suspension and only yields.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    steps: Mutex<Vec<Suspend>>,
}

impl RecordingScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every suspension.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn steps(&self) -> Vec<Suspend> {
        self.steps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scheduler for RecordingScheduler {
    async fn suspend(&self, step: Suspend) {
        self.steps.lock().unwrap().push(step);
        tokio::task::yield_now().await;
    }
}
