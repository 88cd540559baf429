//! Scoring rules and events.

pub mod events;
pub mod rules;
