//! Test access oracle: a fixed table of granted levels.

use std::collections::HashMap;

use chatplays_core::identity::{AccessLevel, AccessOracle, Identity};

/// Grants each listed identity exactly the levels it was given.
#[derive(Debug, Clone, Default)]
pub struct StaticAccess {
    grants: HashMap<String, Vec<AccessLevel>>,
}

impl StaticAccess {
    /// An oracle that grants nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `level` to `identity`.
    #[must_use]
    pub fn grant(mut self, identity: &str, level: AccessLevel) -> Self {
        self.grants.entry(identity.to_owned()).or_default().push(level);
        self
    }
}

impl AccessOracle for StaticAccess {
    fn has_access(&self, identity: &Identity, level: AccessLevel, or_higher: bool) -> bool {
        self.grants.get(identity.as_str()).is_some_and(|held| {
            held.iter()
                .any(|granted| *granted == level || (or_higher && *granted > level))
        })
    }
}
