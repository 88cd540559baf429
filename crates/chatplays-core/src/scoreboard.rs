//! Scoreboard boundary and log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// What a log record describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogKind {
    /// A solve worth `value` points.
    Solve { value: i32 },
    /// `count` strikes.
    Strike { count: u32 },
}

/// A solve or strike as written to the scoreboard log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// When the solve or strike was awarded.
    pub occurred_at: DateTime<Utc>,
    /// The module code on the bomb.
    pub module_code: String,
    /// Who received the award.
    pub identity: Identity,
    /// The module's display name.
    pub module_name: String,
    /// Solve or strike detail.
    #[serde(flatten)]
    pub kind: LogKind,
}

/// External per-player score store.
pub trait Scoreboard: Send + Sync {
    /// Adds `delta` points (negative for penalties).
    fn add_score(&self, identity: &Identity, delta: i32);

    /// Records one solve.
    fn add_solve(&self, identity: &Identity);

    /// Records `count` strikes.
    fn add_strike(&self, identity: &Identity, count: u32);

    /// Appends a solve or strike record to the game log.
    fn append_log(&self, record: &LogRecord);
}
