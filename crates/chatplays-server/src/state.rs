//! Host state: the registry, the descriptor store and the simulated bomb
//! with one solver per module.

use std::sync::Arc;

use chatplays_core::chat::ChatSink;
use chatplays_core::clock::{Clock, SystemClock};
use chatplays_core::error::ConfigError;
use chatplays_core::game::BombCommander;
use chatplays_core::handler::HandlerKind;
use chatplays_core::identity::Identity;
use chatplays_core::scheduler::Scheduler;
use chatplays_core::scoreboard::Scoreboard;
use chatplays_core::settings::PlaySettings;
use chatplays_dispatch::{ModuleSolver, SolverContext};
use chatplays_registry::shim::{AntiTrollShim, TrollCommands};
use chatplays_registry::store::{self, DescriptorStore, JsonFileStore};
use chatplays_registry::{ModuleInstance, ModuleRegistry};
use chatplays_scoring::ScoringLedger;
use tracing::{info, warn};

use crate::config::Config;
use crate::console::{ConsoleAccess, TallyScoreboard, TracingCameras, TracingMusic};
use crate::error::AppError;
use crate::router::Router;
use crate::sim::{KeypadPanel, Outcome, SimBomb, SimModule, WiresHandler};

/// Module type of the wires module.
pub const WIRES_TYPE: &str = "WireSetComponentSolver";
/// Module type of the keypad module.
pub const KEYPAD_TYPE: &str = "DemoKeypad";
/// Module type of the module with no command entry point.
pub const MYSTERY_TYPE: &str = "DemoMysteryBox";

const STRIKE_LIMIT: u32 = 3;
const STARTING_TIME: f32 = 300.0;
const WIRE_COUNT: usize = 4;
const KEYPAD_SCORE: i32 = 4;
const TROLL_COMMANDS: &[(&str, &str)] = &[("^press( 4){3,}$", "Mashing key 4 is not allowed.")];

/// Everything the console host holds for one bomb.
pub struct AppState {
    pub registry: Arc<ModuleRegistry>,
    pub store: Arc<dyn DescriptorStore>,
    pub bomb: Arc<SimBomb>,
    pub scoreboard: Arc<TallyScoreboard>,
    pub router: Router,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("bomb", &self.bomb)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Builds the registry, loads persisted descriptors and arms a bomb.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] when the descriptor file is unreadable
    /// and [`AppError::Config`] when a troll-command pattern is invalid.
    pub async fn build(
        config: &Config,
        settings: PlaySettings,
        chat: Arc<dyn ChatSink>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self, AppError> {
        let registry = Arc::new(ModuleRegistry::with_builtin_table());
        registry.set_game_modes(config.modes);
        register_handlers(&registry, &settings)?;

        let store: Arc<dyn DescriptorStore> = Arc::new(JsonFileStore::new(&config.module_data));
        let loaded = store::load_into(&registry, store.as_ref()).await?;
        info!(loaded, path = %config.module_data.display(), "module descriptors ready");

        let bomb = Arc::new(SimBomb::new(STRIKE_LIMIT, 0, STARTING_TIME));
        let scoreboard = Arc::new(TallyScoreboard::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ctx = SolverContext {
            bomb: Arc::clone(&bomb) as Arc<dyn BombCommander>,
            chat,
            cameras: Some(Arc::new(TracingCameras)),
            music: Arc::new(TracingMusic),
            scoreboard: Arc::clone(&scoreboard) as Arc<dyn Scoreboard>,
            access: Arc::new(ConsoleAccess::new(&config.streamer, &config.admins)),
            scheduler,
            clock,
            ledger: ScoringLedger::new(settings, config.modes).shared(),
            registry: Arc::clone(&registry),
        };

        let mut router = Router::new(Identity::new(config.streamer.as_str()));
        for (code, instance, module) in arm(&bomb) {
            let solver = ModuleSolver::new(code, &instance, module, ctx.clone());
            info!(
                module = %code,
                module_type = %instance.module_type,
                kind = %solver.kind(),
                "module armed"
            );
            router.insert(Arc::new(solver));
        }
        let solvable = router
            .solvers()
            .filter(|solver| solver.kind() != HandlerKind::Unsupported)
            .count();
        bomb.set_solvable_modules(u32::try_from(solvable).unwrap_or(u32::MAX));

        Ok(Self {
            registry,
            store,
            bomb,
            scoreboard,
            router,
        })
    }

    /// Writes the descriptors if any changed. Returns whether a write
    /// happened.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] when the write fails.
    pub async fn persist(&self) -> Result<bool, AppError> {
        Ok(store::write_if_changed(&self.registry, self.store.as_ref()).await?)
    }

    /// The bomb is defused or has exploded.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.bomb.is_defused() || self.bomb.explosion().is_some()
    }
}

fn register_handlers(registry: &ModuleRegistry, settings: &PlaySettings) -> Result<(), AppError> {
    registry.register_builtin(WIRES_TYPE, |_| Box::new(WiresHandler::new(WIRE_COUNT)));

    let trolls = TrollCommands::compile(TROLL_COMMANDS).map_err(|error| {
        warn!(%error, "troll command pattern failed to compile");
        ConfigError::Invalid(error.to_string())
    })?;
    let enabled = settings.enable_troll_commands;
    registry.register_shim(KEYPAD_TYPE, move |inner| {
        Box::new(AntiTrollShim::with_commands(inner, trolls.clone(), enabled))
    });
    Ok(())
}

fn arm(bomb: &Arc<SimBomb>) -> Vec<(&'static str, ModuleInstance, Arc<SimModule>)> {
    let wires = Arc::new(SimModule::new(
        WIRES_TYPE,
        "Wires",
        &[
            ("wire 1", Outcome::Strike),
            ("wire 2", Outcome::Strike),
            ("wire 3", Outcome::Solve),
            ("wire 4", Outcome::Nothing),
        ],
        Arc::clone(bomb),
    ));

    let keypad = Arc::new(SimModule::new(
        KEYPAD_TYPE,
        "Keypad",
        &[
            ("key 1", Outcome::Nothing),
            ("key 2", Outcome::Solve),
            ("key 3", Outcome::Nothing),
            ("key 4", Outcome::Strike),
        ],
        Arc::clone(bomb),
    ));
    let panel = Arc::new(KeypadPanel::new(
        Arc::clone(&keypad),
        &["1", "2", "3", "4"],
        KEYPAD_SCORE,
    ));

    let mystery = Arc::new(SimModule::new(
        MYSTERY_TYPE,
        "Mystery Box",
        &[],
        Arc::clone(bomb),
    ));

    vec![
        ("1", ModuleInstance::new(WIRES_TYPE, "Wires"), wires),
        (
            "2",
            ModuleInstance::new(KEYPAD_TYPE, "Keypad")
                .with_component(panel)
                .with_status_light(0.075, 0.075),
            keypad,
        ),
        ("3", ModuleInstance::new(MYSTERY_TYPE, "Mystery Box"), mystery),
    ]
}
