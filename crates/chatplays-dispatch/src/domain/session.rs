//! Single-flight state of one in-progress command.

use chatplays_core::identity::Identity;
use uuid::Uuid;

/// One command being processed against one module.
#[derive(Debug, Clone)]
pub struct DispatchSession {
    /// Correlates every event the command causes.
    pub id: Uuid,
    /// Who sent the command.
    pub invoker: Identity,
    /// Who plain solves and strikes are credited to; cleared when the
    /// module is solved automatically.
    pub current: Option<Identity>,
    /// Credit for the next strike.
    pub delegated_striker: Option<Identity>,
    /// Credit for the next solve.
    pub delegated_solver: Option<Identity>,
    /// Shown with the next strike award.
    pub strike_message: Option<String>,
    /// Strikes keep the run going and are credited in one batch.
    pub multiple_strikes: bool,
    /// Something in the run counted as a response.
    pub responded: bool,
    pub parse_error: bool,
    /// The bomb face was rotated and needs resetting.
    pub rotated: bool,
    pub camera_hidden: bool,
    pub music_started: bool,
    /// A fault solved the module during the run.
    pub faulted: bool,
}

impl DispatchSession {
    /// Opens a session for `invoker`.
    #[must_use]
    pub fn new(id: Uuid, invoker: Identity) -> Self {
        Self {
            id,
            current: Some(invoker.clone()),
            invoker,
            delegated_striker: None,
            delegated_solver: None,
            strike_message: None,
            multiple_strikes: false,
            responded: false,
            parse_error: false,
            rotated: false,
            camera_hidden: false,
            music_started: false,
            faulted: false,
        }
    }

    /// Who a strike is credited to, consuming the delegation.
    pub fn take_striker(&mut self) -> Option<Identity> {
        self.delegated_striker
            .take()
            .or_else(|| self.current.clone())
    }

    /// Who a solve is credited to, consuming the delegation.
    pub fn take_solver(&mut self) -> Option<Identity> {
        self.delegated_solver
            .take()
            .or_else(|| self.current.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delegation_is_consumed_once() {
        let mut session = DispatchSession::new(Uuid::new_v4(), Identity::new("dave"));
        session.delegated_striker = Some(Identity::new("erin"));

        assert_eq!(session.take_striker(), Some(Identity::new("erin")));
        assert_eq!(session.take_striker(), Some(Identity::new("dave")));
    }

    #[test]
    fn test_cleared_current_means_no_credit() {
        let mut session = DispatchSession::new(Uuid::new_v4(), Identity::new("dave"));
        session.current = None;

        assert_eq!(session.take_solver(), None);
    }
}
