//! Wiring shared by the solver tests.

use std::sync::Arc;

use chatplays_core::chat::ChatSink;
use chatplays_core::clock::Clock;
use chatplays_core::command::ModuleCommand;
use chatplays_core::directive::Directive;
use chatplays_core::game::{BombCommander, BombModule, ModuleCameras, MusicPlayer};
use chatplays_core::identity::{AccessLevel, AccessOracle, Identity};
use chatplays_core::scheduler::Scheduler;
use chatplays_core::scoreboard::Scoreboard;
use chatplays_core::settings::{GameModes, PlaySettings};
use chatplays_registry::{ModuleDescriptor, ModuleRegistry};
use chatplays_scoring::{ScoringLedger, SharedLedger};
use chatplays_test_support::{
    FixedClock, MockBombCommander, Press, RecordingCameras, RecordingChat, RecordingMusic,
    RecordingScheduler, RecordingScoreboard, ScriptedHandler, ScriptedModule, StaticAccess,
};

use crate::application::context::SolverContext;
use crate::application::solver::ModuleSolver;

pub(crate) struct Fixture {
    pub(crate) bomb: Arc<MockBombCommander>,
    pub(crate) chat: Arc<RecordingChat>,
    pub(crate) cameras: Arc<RecordingCameras>,
    pub(crate) music: Arc<RecordingMusic>,
    pub(crate) scoreboard: Arc<RecordingScoreboard>,
    pub(crate) scheduler: Arc<RecordingScheduler>,
    pub(crate) ledger: SharedLedger,
    access: StaticAccess,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::on(MockBombCommander::new())
    }

    pub(crate) fn on(bomb: MockBombCommander) -> Self {
        Self {
            bomb: Arc::new(bomb),
            chat: Arc::new(RecordingChat::new()),
            cameras: Arc::new(RecordingCameras::new()),
            music: Arc::new(RecordingMusic::new()),
            scoreboard: Arc::new(RecordingScoreboard::new()),
            scheduler: Arc::new(RecordingScheduler::new()),
            ledger: ScoringLedger::new(PlaySettings::default(), GameModes::default()).shared(),
            access: StaticAccess::new(),
        }
    }

    pub(crate) fn with_modes(mut self, modes: GameModes) -> Self {
        self.ledger = ScoringLedger::new(PlaySettings::default(), modes).shared();
        self
    }

    pub(crate) fn with_settings(mut self, settings: PlaySettings) -> Self {
        self.ledger = ScoringLedger::new(settings, GameModes::default()).shared();
        self
    }

    pub(crate) fn grant(mut self, identity: &str, level: AccessLevel) -> Self {
        self.access = self.access.grant(identity, level);
        self
    }

    pub(crate) fn context(&self) -> SolverContext {
        SolverContext {
            bomb: Arc::clone(&self.bomb) as Arc<dyn BombCommander>,
            chat: Arc::clone(&self.chat) as Arc<dyn ChatSink>,
            cameras: Some(Arc::clone(&self.cameras) as Arc<dyn ModuleCameras>),
            music: Arc::clone(&self.music) as Arc<dyn MusicPlayer>,
            scoreboard: Arc::clone(&self.scoreboard) as Arc<dyn Scoreboard>,
            access: Arc::new(self.access.clone()) as Arc<dyn AccessOracle>,
            scheduler: Arc::clone(&self.scheduler) as Arc<dyn Scheduler>,
            clock: Arc::new(FixedClock::epoch()) as Arc<dyn Clock>,
            ledger: Arc::clone(&self.ledger),
            registry: Arc::new(ModuleRegistry::new()),
        }
    }

    /// Places `module` on this fixture's bomb.
    pub(crate) fn module(&self, module: ScriptedModule) -> Arc<ScriptedModule> {
        Arc::new(module.on_bomb(Arc::clone(&self.bomb)))
    }

    pub(crate) fn solver(&self, module: &Arc<ScriptedModule>, handler: ScriptedHandler) -> ModuleSolver {
        self.solver_with(module, handler, ModuleDescriptor::new("wires"))
    }

    pub(crate) fn solver_with(
        &self,
        module: &Arc<ScriptedModule>,
        handler: ScriptedHandler,
        descriptor: ModuleDescriptor,
    ) -> ModuleSolver {
        ModuleSolver::with_handler(
            "7",
            Arc::clone(module) as Arc<dyn BombModule>,
            Box::new(handler),
            descriptor,
            self.context(),
        )
    }
}

pub(crate) fn command(identity: &str, text: &str) -> ModuleCommand {
    ModuleCommand::new("7", Identity::new(identity), text)
}

/// A wire module: `alarm` does nothing, `cut` solves, `bad` strikes and
/// `fake` fake-strikes.
pub(crate) fn wires() -> ScriptedModule {
    ScriptedModule::new("wires", "Wires")
        .press("alarm", Press::Nothing)
        .press("cut", Press::Solve)
        .press("bad", Press::Strike)
        .press("fake", Press::FakeStrike)
}

/// A handler answering every command with an acknowledgement followed by
/// `steps`.
pub(crate) fn acknowledged(steps: &[Directive]) -> ScriptedHandler {
    let mut all = vec![Directive::value("ack")];
    all.extend_from_slice(steps);
    ScriptedHandler::from_steps(all)
}
