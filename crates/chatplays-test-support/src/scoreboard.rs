//! Test scoreboard: records score, solve, strike and log calls.

use std::sync::Mutex;

use chatplays_core::identity::Identity;
use chatplays_core::scoreboard::{LogRecord, Scoreboard};

/// One scoreboard call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreboardCall {
    Score { identity: String, delta: i32 },
    Solve { identity: String },
    Strike { identity: String, count: u32 },
}

/// A scoreboard that records every call.
#[derive(Debug, Default)]
pub struct RecordingScoreboard {
    calls: Mutex<Vec<ScoreboardCall>>,
    log: Mutex<Vec<LogRecord>>,
}

impl RecordingScoreboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every score, solve and strike call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<ScoreboardCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns a snapshot of the appended log records.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn log(&self) -> Vec<LogRecord> {
        self.log.lock().unwrap().clone()
    }

    /// Net score recorded for `identity`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn score_of(&self, identity: &str) -> i32 {
        self.calls()
            .iter()
            .map(|call| match call {
                ScoreboardCall::Score { identity: who, delta } if who == identity => *delta,
                _ => 0,
            })
            .sum()
    }
}

impl Scoreboard for RecordingScoreboard {
    fn add_score(&self, identity: &Identity, delta: i32) {
        self.calls.lock().unwrap().push(ScoreboardCall::Score {
            identity: identity.as_str().to_owned(),
            delta,
        });
    }

    fn add_solve(&self, identity: &Identity) {
        self.calls.lock().unwrap().push(ScoreboardCall::Solve {
            identity: identity.as_str().to_owned(),
        });
    }

    fn add_strike(&self, identity: &Identity, count: u32) {
        self.calls.lock().unwrap().push(ScoreboardCall::Strike {
            identity: identity.as_str().to_owned(),
            count,
        });
    }

    fn append_log(&self, record: &LogRecord) {
        self.log.lock().unwrap().push(record.clone());
    }
}
