//! Wall-clock source for the scoring ledger.
//!
//! Every event the ledger emits, time-mode bonuses included, carries an
//! `occurred_at` stamp taken from a [`Clock`], which the scoreboard log copies
//! into its records. Tests pin it with a fixed clock; the host reads the
//! system time.

use chrono::{DateTime, Utc};

/// Stamps ledger events.
pub trait Clock: Send + Sync {
    /// The instant a solve or strike is booked.
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the operating system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
