//! Collaborators shared by every module solver on a bomb.

use std::sync::Arc;

use chatplays_core::chat::ChatSink;
use chatplays_core::clock::Clock;
use chatplays_core::game::{BombCommander, ModuleCameras, MusicPlayer};
use chatplays_core::identity::AccessOracle;
use chatplays_core::scheduler::Scheduler;
use chatplays_core::scoreboard::Scoreboard;
use chatplays_registry::ModuleRegistry;
use chatplays_scoring::SharedLedger;

/// Everything a solver talks to besides its own module and handler.
#[derive(Clone)]
pub struct SolverContext {
    pub bomb: Arc<dyn BombCommander>,
    pub chat: Arc<dyn ChatSink>,
    /// Absent when the stream runs without picture-in-picture cameras.
    pub cameras: Option<Arc<dyn ModuleCameras>>,
    pub music: Arc<dyn MusicPlayer>,
    pub scoreboard: Arc<dyn Scoreboard>,
    pub access: Arc<dyn AccessOracle>,
    pub scheduler: Arc<dyn Scheduler>,
    pub clock: Arc<dyn Clock>,
    pub ledger: SharedLedger,
    pub registry: Arc<ModuleRegistry>,
}

impl SolverContext {
    /// Runs `f` against the cameras, if any.
    pub(crate) fn with_cameras(&self, f: impl FnOnce(&dyn ModuleCameras)) {
        if let Some(cameras) = &self.cameras {
            f(cameras.as_ref());
        }
    }
}
