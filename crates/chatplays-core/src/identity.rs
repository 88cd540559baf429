//! Chat identities and the access-level boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A chat user as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wraps a chat nickname.
    #[must_use]
    pub fn new(nickname: impl Into<String>) -> Self {
        Self(nickname.into())
    }

    /// Returns the nickname.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Access levels, lowest first.
///
/// `NoPoints` is a flag-like level: holders still play normally but their
/// solve points are banked into the reward pool instead of their score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Defuser,
    NoPoints,
    ScoringManager,
    Mod,
    Admin,
    SuperUser,
    Streamer,
}

/// External authorization oracle.
pub trait AccessOracle: Send + Sync {
    /// Answers whether `identity` holds `level`, or any higher level when
    /// `or_higher` is set.
    fn has_access(&self, identity: &Identity, level: AccessLevel, or_higher: bool) -> bool;
}
