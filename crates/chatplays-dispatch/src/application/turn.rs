//! Bomb-turn coordination between a solve and the command in flight.

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TurnState {
    processing: bool,
    turn_queued: bool,
    ready_to_turn: bool,
}

/// Tracks whether a module is processing a command and whether a bomb turn
/// waits for its solve.
#[derive(Debug)]
pub struct TurnCoordinator {
    state: watch::Sender<TurnState>,
}

impl Default for TurnCoordinator {
    fn default() -> Self {
        Self {
            state: watch::Sender::new(TurnState::default()),
        }
    }
}

impl TurnCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a command as in flight. Returns `false` if one already is.
    pub fn try_begin_processing(&self) -> bool {
        self.state.send_if_modified(|state| {
            if state.processing {
                false
            } else {
                state.processing = true;
                true
            }
        })
    }

    pub fn finish_processing(&self) {
        self.state.send_modify(|state| state.processing = false);
    }

    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.state.borrow().processing
    }

    /// Asks for a bomb turn once the module is solved.
    pub fn queue(&self) {
        self.state.send_modify(|state| state.turn_queued = true);
    }

    /// Withdraws a queued turn.
    pub fn unqueue(&self) {
        self.state.send_if_modified(|state| {
            let was_queued = state.turn_queued;
            state.turn_queued = false;
            was_queued
        });
    }

    #[must_use]
    pub fn is_queued(&self) -> bool {
        self.state.borrow().turn_queued
    }

    /// The module was solved: a queued turn becomes ready.
    pub fn promote(&self) {
        self.state.send_if_modified(|state| {
            if state.turn_queued {
                state.turn_queued = false;
                state.ready_to_turn = true;
                true
            } else {
                false
            }
        });
    }

    /// Waits until a queued turn is settled.
    ///
    /// Returns `true` when the turn became ready and the command in flight
    /// has finished; the readiness is consumed. Returns `false` when the
    /// turn was withdrawn.
    pub async fn wait_ready(&self) -> bool {
        let mut changes = self.state.subscribe();
        let ready = match changes.wait_for(|state| !state.turn_queued).await {
            Ok(state) => state.ready_to_turn,
            Err(_) => return false,
        };
        if !ready {
            return false;
        }
        if changes.wait_for(|state| !state.processing).await.is_err() {
            return false;
        }
        self.state.send_if_modified(|state| {
            let was_ready = state.ready_to_turn;
            state.ready_to_turn = false;
            was_ready
        })
    }
}
