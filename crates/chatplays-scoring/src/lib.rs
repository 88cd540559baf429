//! Chatplays Scoring: the solve and strike ledger.
//!
//! The ledger owns the reward pool and the time-mode multiplier. Awards are
//! computed here and returned as [`ScoringEvent`](domain::events::ScoringEvent)s;
//! the dispatch engine applies them to the scoreboard, chat and bomb.

pub mod application;
pub mod domain;

pub use application::ledger::{Award, ScoringLedger, SharedLedger};
pub use domain::events::{ScoringEvent, ScoringEventKind};
