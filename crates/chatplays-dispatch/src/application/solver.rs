//! The per-module command processor.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chatplays_core::command::ModuleCommand;
use chatplays_core::directive::{Directive, Suspend};
use chatplays_core::error::HandlerFault;
use chatplays_core::game::{BombModule, CameraPriority, ModuleEvent};
use chatplays_core::handler::{CommandCanceller, CommandHandler, HandlerKind, directive_stream};
use chatplays_core::identity::{AccessLevel, Identity};
use chatplays_registry::{ModuleDescriptor, ModuleInstance, Resolved};
use chatplays_scoring::Award;
use futures::StreamExt;
use regex::{RegexSet, RegexSetBuilder};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::application::context::SolverContext;
use crate::application::turn::TurnCoordinator;
use crate::domain::meta::MetaCommand;
use crate::domain::outcome::DispatchOutcome;
use crate::domain::session::DispatchSession;

/// Pause taken around focusing and defocusing a module.
pub const FOCUS_PAUSE: Duration = Duration::from_millis(500);

pub(crate) const AUTO_SOLVE_NOTICE: &str =
    "Looks like a module ran into a problem while running a command, automatically solving module.";
pub(crate) const SOLVE_BASED_NOTICE: &str =
    " Some other modules may also be solved to prevent problems.";

#[derive(Debug, Default)]
pub(crate) struct SolverState {
    pub(crate) session: Option<DispatchSession>,
    pub(crate) strike_count: u32,
    /// Player who claimed the module; credited with strikes nobody else
    /// caused.
    pub(crate) claimant: Option<Identity>,
    pub(crate) camera_priority: CameraPriority,
}

/// Drives one module on the bomb through its handler.
///
/// Commands are processed one at a time. Module events (pass, strike, fake
/// strike) are queued by the module and settled by [`process_events`],
/// which the solver runs after every step and which the owner calls for
/// events raised between commands.
///
/// [`process_events`]: ModuleSolver::process_events
pub struct ModuleSolver {
    pub(crate) code: String,
    pub(crate) module: Arc<dyn BombModule>,
    pub(crate) handler: Box<dyn CommandHandler>,
    pub(crate) kind: HandlerKind,
    pub(crate) descriptor: ModuleDescriptor,
    pub(crate) ctx: SolverContext,
    pub(crate) canceller: CommandCanceller,
    allow_list: Option<RegexSet>,
    pub(crate) state: Mutex<SolverState>,
    events: Mutex<UnboundedReceiver<ModuleEvent>>,
    turn: TurnCoordinator,
}

impl ModuleSolver {
    /// Resolves the module's handler through the registry and subscribes
    /// to its events.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        instance: &ModuleInstance,
        module: Arc<dyn BombModule>,
        ctx: SolverContext,
    ) -> Self {
        let Resolved {
            handler,
            descriptor,
        } = ctx.registry.resolve(instance);
        Self::with_handler(code, module, handler, descriptor, ctx)
    }

    /// Wraps an already resolved handler.
    #[must_use]
    pub fn with_handler(
        code: impl Into<String>,
        module: Arc<dyn BombModule>,
        handler: Box<dyn CommandHandler>,
        descriptor: ModuleDescriptor,
        ctx: SolverContext,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        module.subscribe(sender);

        Self {
            code: code.into(),
            kind: handler.kind(),
            allow_list: compile_allow_list(&descriptor),
            module,
            handler,
            descriptor,
            ctx,
            canceller: CommandCanceller::new(),
            state: Mutex::new(SolverState::default()),
            events: Mutex::new(receiver),
            turn: TurnCoordinator::new(),
        }
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    #[must_use]
    pub fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.module.is_solved()
    }

    /// Strikes this module has caused since it was created.
    #[must_use]
    pub fn strike_count(&self) -> u32 {
        lock(&self.state).strike_count
    }

    /// Whether a command is running.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.turn.is_processing()
    }

    /// The flag a cancellation request sets.
    #[must_use]
    pub fn canceller(&self) -> &CommandCanceller {
        &self.canceller
    }

    /// Processes one command from chat.
    #[instrument(
        skip(self, command),
        fields(
            module = %self.code,
            session_id = %command.correlation_id,
            identity = %command.identity,
        )
    )]
    pub async fn respond_to_command(&self, command: &ModuleCommand) -> DispatchOutcome {
        // Events raised before this command are not the invoker's doing.
        self.process_events();
        if self.module.is_solved() {
            debug!("module already solved, ignoring command");
            return DispatchOutcome::Ignored;
        }
        let Some(_session) = SessionGuard::open(self, command) else {
            debug!("a command is already running on this module");
            return DispatchOutcome::AlreadyProcessing;
        };

        let identity = &command.identity;
        let (text, forwarded) = match command.forwarded_text() {
            Some(rest) => (rest.trim(), true),
            None => (command.text.trim(), false),
        };
        let meta = if forwarded {
            None
        } else {
            MetaCommand::parse(text)
        };

        if meta == Some(MetaCommand::Unview) {
            lock(&self.state).camera_priority = CameraPriority::NotInUse;
            self.ctx
                .with_cameras(|cameras| cameras.detach(&self.code, false));
            return DispatchOutcome::MetaHandled;
        }
        if let Some(MetaCommand::View { pin }) = meta {
            self.request_view(identity, pin);
        }
        self.attach_camera();

        match meta {
            Some(MetaCommand::View { .. }) => return DispatchOutcome::MetaHandled,
            Some(MetaCommand::Show) => {
                let mut steps = directive_stream([
                    Directive::Suspend(Suspend::Show),
                    Directive::Suspend(Suspend::Frame),
                ]);
                let _acknowledged = steps.next().await;
                return self.run(identity, steps).await;
            }
            Some(MetaCommand::Solve) if self.may_force_solve(identity) => {
                info!("module solved on request");
                let reason = format!(
                    "A module ({}) is being automatically solved.",
                    self.module.display_name()
                );
                self.solve_module(&reason, false).await;
                return DispatchOutcome::ForceSolved;
            }
            _ => {}
        }

        if self.kind == HandlerKind::Unsupported {
            self.ctx.chat.command_error(
                identity,
                &format!(
                    "Module {} ({}) is not supported and cannot take commands.",
                    self.code,
                    self.module.display_name()
                ),
            );
            return DispatchOutcome::Unsupported;
        }
        if !self.allows(text) {
            debug!("command rejected by the module's allow-list");
            self.ctx.chat.command_invalid(identity);
            return DispatchOutcome::Unrecognized;
        }

        self.dispatch(identity, text).await
    }

    fn request_view(&self, identity: &Identity, pin: bool) {
        let pin_allowed = self.descriptor.camera_pinning_always_allowed
            || self.ctx.access.has_access(identity, AccessLevel::Mod, true);
        lock(&self.state).camera_priority = if pin && pin_allowed {
            CameraPriority::Pinned
        } else {
            CameraPriority::Prioritised
        };
    }

    fn attach_camera(&self) {
        let priority = lock(&self.state).camera_priority;
        if self.ctx.bomb.is_multi_decker() || priority > CameraPriority::NotInUse {
            self.ctx.with_cameras(|cameras| {
                cameras.attach(&self.code, priority.max(CameraPriority::InUse));
            });
        }
    }

    fn may_force_solve(&self, identity: &Identity) -> bool {
        self.kind != HandlerKind::Unsupported
            && self.ctx.access.has_access(identity, AccessLevel::Admin, true)
    }

    fn allows(&self, text: &str) -> bool {
        self.allow_list
            .as_ref()
            .is_none_or(|patterns| patterns.is_match(text))
    }

    /// Settles every module event queued so far.
    pub fn process_events(&self) {
        loop {
            let event = match lock(&self.events).try_recv() {
                Ok(event) => event,
                Err(_) => break,
            };
            match event {
                ModuleEvent::Pass => self.on_pass(),
                ModuleEvent::Strike => self.on_strike(),
                ModuleEvent::FakeStrike => self.on_fake_strike(),
            }
        }
    }

    /// Credits a solve and updates the bomb's bookkeeping.
    ///
    /// The delegated solver is credited first, then the invoker of the
    /// running command; with neither, nobody is.
    pub fn on_pass(&self) {
        if self.module.is_needy() {
            return;
        }

        let solver = lock(&self.state)
            .session
            .as_mut()
            .and_then(DispatchSession::take_solver);
        if let Some(identity) = solver {
            self.award_solve(&identity);
        }

        self.ctx.bomb.record_solve();
        self.ctx.with_cameras(|cameras| cameras.update_solves());
        self.turn.promote();
        self.ctx
            .with_cameras(|cameras| cameras.detach(&self.code, true));
    }

    /// Counts a strike and credits it.
    ///
    /// While a run batches strikes, the strike is only counted; the batch
    /// is credited when the run winds down.
    pub fn on_strike(&self) {
        let recipient = {
            let mut state = lock(&self.state);
            state.strike_count += 1;
            if state
                .session
                .as_ref()
                .is_some_and(|session| session.multiple_strikes)
            {
                return;
            }
            Self::strike_recipient(&mut state)
        };

        match recipient {
            Some(identity) => self.award_strikes(&identity, 1),
            None => warn!(module = %self.code, "strike with nobody to credit"),
        }
        self.ctx.with_cameras(|cameras| cameras.update_strikes(true));
    }

    /// Announces a strike that changes no counters.
    pub fn on_fake_strike(&self) {
        let recipient = Self::strike_recipient(&mut lock(&self.state));
        if let Some(identity) = recipient {
            self.award_strikes(&identity, 0);
        }
    }

    fn strike_recipient(state: &mut SolverState) -> Option<Identity> {
        let credited = state
            .session
            .as_mut()
            .and_then(DispatchSession::take_striker);
        credited.or_else(|| state.claimant.clone())
    }

    fn award_solve(&self, identity: &Identity) {
        let no_points = self
            .ctx
            .access
            .has_access(identity, AccessLevel::NoPoints, false);
        let award = self.award_for(identity);
        let events = {
            let mut ledger = lock(&self.ctx.ledger);
            let points = ledger.module_score(
                self.descriptor.score,
                self.descriptor.score_is_dynamic,
                self.ctx.bomb.solvable_modules(),
            );
            ledger.award_solve(
                &award,
                points,
                no_points,
                self.ctx.bomb.current_timer(),
                self.ctx.clock.as_ref(),
            )
        };
        self.apply(&events);
    }

    pub(crate) fn award_strikes(&self, identity: &Identity, count: u32) {
        let message = if count > 0 {
            self.with_session(|session| session.strike_message.take())
                .flatten()
        } else {
            None
        };
        let award = self.award_for(identity);
        let events = lock(&self.ctx.ledger).award_strikes(
            &award,
            count,
            self.descriptor.strike_penalty,
            message.as_deref(),
            self.ctx.bomb.current_timer(),
            self.ctx.clock.as_ref(),
        );
        self.apply(&events);
    }

    pub(crate) fn penalise_unsubmittable(&self, identity: &Identity) {
        let award = self.award_for(identity);
        // Based on the declared score even for dynamically scored modules.
        let event = lock(&self.ctx.ledger).unsubmittable_penalty(
            &award,
            self.descriptor.score,
            self.ctx.clock.as_ref(),
        );
        if let Some(event) = event {
            self.apply(std::slice::from_ref(&event));
        }
    }

    fn award_for<'a>(&'a self, identity: &'a Identity) -> Award<'a> {
        Award {
            module_code: &self.code,
            module_name: self.module.display_name(),
            identity,
            correlation_id: self.correlation_id(),
        }
    }

    fn correlation_id(&self) -> Uuid {
        lock(&self.state)
            .session
            .as_ref()
            .map_or_else(Uuid::new_v4, |session| session.id)
    }

    /// Solves the module on the handler's behalf.
    ///
    /// Nobody is credited. The handler's own forced-solve routine runs
    /// first; if the module is still unsolved afterwards it is passed
    /// directly.
    pub async fn solve_module(&self, reason: &str, remove_solve_based: bool) {
        let suffix = if remove_solve_based {
            SOLVE_BASED_NOTICE
        } else {
            ""
        };
        self.ctx.chat.send_message(&format!("{reason}{suffix}"));
        self.clear_credit();
        if remove_solve_based {
            self.ctx.bomb.remove_solve_based_modules();
        }

        match self.handler.forced_solve() {
            Ok(Some(mut steps)) => {
                while let Some(step) = steps.next().await {
                    match step {
                        Ok(Directive::Suspend(suspend)) => {
                            self.ctx.scheduler.suspend(suspend).await;
                        }
                        Ok(other) => debug!(directive = ?other, "ignored during forced solve"),
                        Err(fault) => {
                            warn!(module = %self.code, error = %fault, "forced solve failed");
                            break;
                        }
                    }
                }
            }
            Ok(None) => {}
            Err(fault) => {
                warn!(module = %self.code, error = %fault, "forced solve could not start");
            }
        }

        if !self.module.is_solved() {
            self.module.force_pass();
        }
        self.process_events();
    }

    /// Passes the module without crediting anyone or telling chat.
    pub fn solve_silently(&self) {
        self.clear_credit();
        self.module.force_pass();
        self.process_events();
    }

    pub(crate) async fn handle_fault(&self, fault: HandlerFault) {
        error!(module = %self.code, error = %fault, "module handler faulted");
        self.with_session(|session| session.faulted = true);
        self.solve_module(AUTO_SOLVE_NOTICE, true).await;
    }

    fn clear_credit(&self) {
        self.with_session(|session| {
            session.current = None;
            session.delegated_solver = None;
        });
    }

    /// Asks for a bomb turn once this module is solved.
    pub fn queue_turn(&self) {
        self.turn.queue();
    }

    /// Withdraws a queued bomb turn.
    pub fn cancel_turn(&self) {
        self.turn.unqueue();
    }

    /// Turns the bomb once the queued turn is ready and no command runs.
    /// Returns whether the bomb was turned.
    pub async fn turn_bomb_on_solve(&self) -> bool {
        if !self.turn.wait_ready().await {
            return false;
        }
        self.ctx.bomb.turn_bomb().await;
        self.pause().await;
        true
    }

    /// Asks the running command to stop at its next cancellation point.
    pub fn request_cancel(&self) {
        self.canceller.request();
        self.handler.set_cancel_requested(true);
    }

    pub fn set_claimant(&self, claimant: Option<Identity>) {
        lock(&self.state).claimant = claimant;
    }

    #[must_use]
    pub fn claimant(&self) -> Option<Identity> {
        lock(&self.state).claimant.clone()
    }

    /// Module types this module asks the bomb to stop tracking.
    #[must_use]
    pub fn abandoned_modules(&self) -> Vec<String> {
        self.handler.abandoned_modules()
    }

    pub(crate) fn with_session<R>(&self, f: impl FnOnce(&mut DispatchSession) -> R) -> Option<R> {
        lock(&self.state).session.as_mut().map(f)
    }

    pub(crate) async fn pause(&self) {
        self.ctx.scheduler.suspend(Suspend::Wait(FOCUS_PAUSE)).await;
    }
}

impl fmt::Debug for ModuleSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleSolver")
            .field("code", &self.code)
            .field("module_type", &self.module.module_type())
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Holds the module's in-flight flag for one command and clears the
/// session on every exit path.
struct SessionGuard<'a> {
    solver: &'a ModuleSolver,
}

impl<'a> SessionGuard<'a> {
    fn open(solver: &'a ModuleSolver, command: &ModuleCommand) -> Option<Self> {
        if !solver.turn.try_begin_processing() {
            return None;
        }
        lock(&solver.state).session = Some(DispatchSession::new(
            command.correlation_id,
            command.identity.clone(),
        ));
        Some(Self { solver })
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        lock(&self.solver.state).session = None;
        self.solver.turn.finish_processing();
    }
}

fn compile_allow_list(descriptor: &ModuleDescriptor) -> Option<RegexSet> {
    let patterns = descriptor.valid_commands.as_ref()?;
    match RegexSetBuilder::new(patterns).case_insensitive(true).build() {
        Ok(set) => Some(set),
        Err(error) => {
            warn!(
                module_id = %descriptor.module_id,
                %error,
                "invalid command pattern, allowing every command"
            );
            None
        }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use chatplays_core::directive::SelectableId;
    use chatplays_core::settings::GameModes;
    use chatplays_test_support::{
        BombCall, CameraCall, ChatLine, MockBombCommander, ScoreboardCall, ScriptedHandler,
        ScriptedModule,
    };

    use super::*;
    use crate::application::fixture::{Fixture, acknowledged, command, wires};

    #[tokio::test]
    async fn test_solved_module_ignores_commands() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let handler = ScriptedHandler::from_steps(vec![Directive::value("ack")]);
        let solver = fixture.solver(&module, handler.clone());
        module.raise(ModuleEvent::Pass);

        let outcome = solver.respond_to_command(&command("dave", "cut")).await;

        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert!(handler.commands().is_empty());
    }

    #[tokio::test]
    async fn test_second_command_is_rejected_while_first_runs() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let handler = ScriptedHandler::from_steps(vec![
            Directive::value("ack"),
            Directive::value("one"),
            Directive::value("two"),
        ]);
        let solver = fixture.solver(&module, handler.clone());

        let first = command("dave", "press alarm");
        let second = command("erin", "press alarm");
        let (first, second) = tokio::join!(solver.respond_to_command(&first), async {
            tokio::task::yield_now().await;
            solver.respond_to_command(&second).await
        });

        assert_eq!(first, DispatchOutcome::Completed { responded: true });
        assert_eq!(second, DispatchOutcome::AlreadyProcessing);
        assert_eq!(handler.commands(), vec!["press alarm"]);
        assert!(!solver.is_processing());

        let third = solver.respond_to_command(&command("erin", "press alarm")).await;
        assert_eq!(third, DispatchOutcome::Completed { responded: true });
    }

    #[tokio::test]
    async fn test_view_pin_needs_mod_access() {
        let fixture = Fixture::new().grant("erin", AccessLevel::Mod);
        let module = fixture.module(wires());
        let solver = fixture.solver(&module, ScriptedHandler::unrecognizing());

        let outcome = solver.respond_to_command(&command("dave", "view pin")).await;
        assert_eq!(outcome, DispatchOutcome::MetaHandled);
        solver.respond_to_command(&command("erin", "View Pin")).await;

        assert_eq!(
            fixture.cameras.calls(),
            vec![
                CameraCall::Attach("7".to_owned(), CameraPriority::Prioritised),
                CameraCall::Attach("7".to_owned(), CameraPriority::Pinned),
            ]
        );
    }

    #[tokio::test]
    async fn test_pinning_can_be_allowed_per_module() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let mut descriptor = ModuleDescriptor::new("wires");
        descriptor.camera_pinning_always_allowed = true;
        let solver = fixture.solver_with(&module, ScriptedHandler::unrecognizing(), descriptor);

        solver.respond_to_command(&command("dave", "view pin")).await;

        assert_eq!(
            fixture.cameras.calls(),
            vec![CameraCall::Attach("7".to_owned(), CameraPriority::Pinned)]
        );
    }

    #[tokio::test]
    async fn test_unview_detaches_and_forgets_priority() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let solver = fixture.solver(&module, ScriptedHandler::unrecognizing());

        solver.respond_to_command(&command("dave", "view")).await;
        let outcome = solver.respond_to_command(&command("dave", "UNVIEW")).await;
        solver.respond_to_command(&command("dave", "press alarm")).await;

        assert_eq!(outcome, DispatchOutcome::MetaHandled);
        assert_eq!(
            fixture.cameras.calls(),
            vec![
                CameraCall::Attach("7".to_owned(), CameraPriority::Prioritised),
                CameraCall::Detach {
                    module_code: "7".to_owned(),
                    delayed: false,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_multi_decker_attaches_camera_for_plain_commands() {
        let fixture = Fixture::on(MockBombCommander::new().multi_decker());
        let module = fixture.module(wires());
        let solver = fixture.solver(&module, ScriptedHandler::unrecognizing());

        solver.respond_to_command(&command("dave", "press alarm")).await;

        assert_eq!(
            fixture.cameras.calls(),
            vec![CameraCall::Attach("7".to_owned(), CameraPriority::InUse)]
        );
    }

    #[tokio::test]
    async fn test_show_pulses_focus_without_the_handler() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let handler = ScriptedHandler::unrecognizing();
        let solver = fixture.solver(&module, handler.clone());

        let outcome = solver.respond_to_command(&command("dave", "show")).await;

        assert_eq!(outcome, DispatchOutcome::Completed { responded: true });
        assert!(handler.commands().is_empty());
        assert_eq!(
            fixture.bomb.calls(),
            vec![BombCall::Focus("7".to_owned()), BombCall::Defocus("7".to_owned())]
        );
        assert!(fixture.scheduler.steps().contains(&Suspend::Frame));
        assert!(!fixture.scheduler.steps().contains(&Suspend::Show));
    }

    #[tokio::test]
    async fn test_admin_solve_short_circuits() {
        let fixture = Fixture::new().grant("root", AccessLevel::Admin);
        let module = fixture.module(wires());
        let handler = ScriptedHandler::unrecognizing();
        let solver = fixture.solver(&module, handler.clone());

        let outcome = solver.respond_to_command(&command("root", "solve")).await;

        assert_eq!(outcome, DispatchOutcome::ForceSolved);
        assert!(module.is_solved());
        assert!(handler.commands().is_empty());
        assert_eq!(
            fixture.chat.messages(),
            vec!["A module (Wires) is being automatically solved."]
        );
        assert_eq!(fixture.scoreboard.score_of("root"), 0);
        assert_eq!(fixture.bomb.solved_modules(), 1);
    }

    #[tokio::test]
    async fn test_solve_without_admin_reaches_the_handler() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let handler = ScriptedHandler::unrecognizing();
        let solver = fixture.solver(&module, handler.clone());

        let outcome = solver.respond_to_command(&command("dave", "solve")).await;

        assert_eq!(outcome, DispatchOutcome::Unrecognized);
        assert_eq!(handler.commands(), vec!["solve"]);
        assert!(!module.is_solved());
    }

    #[tokio::test]
    async fn test_send_to_module_skips_meta_commands() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let handler = ScriptedHandler::from_steps(vec![Directive::value("ack")]);
        let solver = fixture.solver(&module, handler.clone());

        solver
            .respond_to_command(&command("dave", "Send to module view"))
            .await;

        assert_eq!(handler.commands(), vec!["view"]);
        assert!(fixture.cameras.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_module_reports_error() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let handler = ScriptedHandler::unrecognizing().with_kind(HandlerKind::Unsupported);
        let solver = fixture.solver(&module, handler.clone());

        let outcome = solver.respond_to_command(&command("dave", "cut")).await;

        assert_eq!(outcome, DispatchOutcome::Unsupported);
        assert!(handler.commands().is_empty());
        assert!(matches!(
            fixture.chat.lines().as_slice(),
            [ChatLine::Error { identity, .. }] if identity == "dave"
        ));
    }

    #[tokio::test]
    async fn test_unsupported_module_cannot_be_force_solved_by_command() {
        let fixture = Fixture::new().grant("root", AccessLevel::Admin);
        let module = fixture.module(wires());
        let handler = ScriptedHandler::unrecognizing().with_kind(HandlerKind::Unsupported);
        let solver = fixture.solver(&module, handler);

        let outcome = solver.respond_to_command(&command("root", "solve")).await;

        assert_eq!(outcome, DispatchOutcome::Unsupported);
        assert!(!module.is_solved());
    }

    #[tokio::test]
    async fn test_allow_list_filters_commands_case_insensitively() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let handler = ScriptedHandler::from_steps(vec![Directive::value("ack")]);
        let mut descriptor = ModuleDescriptor::new("wires");
        descriptor.valid_commands = Some(vec![r"^press \d$".to_owned()]);
        let solver = fixture.solver_with(&module, handler.clone(), descriptor);

        let rejected = solver.respond_to_command(&command("dave", "cut all")).await;
        solver.respond_to_command(&command("dave", "PRESS 1")).await;

        assert_eq!(rejected, DispatchOutcome::Unrecognized);
        assert_eq!(handler.commands(), vec!["PRESS 1"]);
    }

    #[tokio::test]
    async fn test_invalid_allow_list_allows_everything() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let handler = ScriptedHandler::from_steps(vec![Directive::value("ack")]);
        let mut descriptor = ModuleDescriptor::new("wires");
        descriptor.valid_commands = Some(vec!["(".to_owned()]);
        let solver = fixture.solver_with(&module, handler.clone(), descriptor);

        solver.respond_to_command(&command("dave", "anything")).await;

        assert_eq!(handler.commands(), vec!["anything"]);
    }

    #[tokio::test]
    async fn test_forced_solve_prefers_handler_routine() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let handler = ScriptedHandler::unrecognizing()
            .with_forced_solve(vec![Directive::wait(Duration::from_millis(50))]);
        let solver = fixture.solver(&module, handler.clone());

        solver.solve_module("stuck", true).await;

        assert_eq!(handler.forced_solves(), 1);
        assert!(
            fixture
                .scheduler
                .steps()
                .contains(&Suspend::Wait(Duration::from_millis(50)))
        );
        assert_eq!(module.force_passes(), 1);
        assert!(module.is_solved());
        assert!(fixture.bomb.calls().contains(&BombCall::RemoveSolveBased));
        assert_eq!(
            fixture.chat.messages(),
            vec![format!("stuck{SOLVE_BASED_NOTICE}")]
        );
    }

    #[tokio::test]
    async fn test_pass_outside_a_command_credits_nobody() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let solver = fixture.solver(&module, ScriptedHandler::unrecognizing());
        solver.set_claimant(Some(Identity::new("carol")));

        solver.solve_silently();

        assert!(module.is_solved());
        assert!(fixture.chat.lines().is_empty());
        assert!(fixture.scoreboard.calls().is_empty());
        assert_eq!(fixture.bomb.solved_modules(), 1);
        assert_eq!(
            fixture.cameras.calls(),
            vec![
                CameraCall::UpdateSolves,
                CameraCall::Detach {
                    module_code: "7".to_owned(),
                    delayed: true,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_needy_pass_changes_nothing() {
        let fixture = Fixture::new();
        let module = fixture.module(ScriptedModule::new("needy", "Knob").needy());
        let solver = fixture.solver(&module, ScriptedHandler::unrecognizing());

        module.raise(ModuleEvent::Pass);
        solver.process_events();

        assert_eq!(fixture.bomb.solved_modules(), 0);
        assert!(fixture.cameras.calls().is_empty());
    }

    #[tokio::test]
    async fn test_strike_outside_a_command_credits_claimant() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let solver = fixture.solver(&module, ScriptedHandler::unrecognizing());
        solver.set_claimant(Some(Identity::new("carol")));

        module.raise(ModuleEvent::Strike);
        solver.process_events();

        assert_eq!(solver.strike_count(), 1);
        assert!(fixture.scoreboard.calls().contains(&ScoreboardCall::Strike {
            identity: "carol".to_owned(),
            count: 1,
        }));
        assert_eq!(
            fixture.cameras.calls(),
            vec![CameraCall::UpdateStrikes { flash: true }]
        );
    }

    #[tokio::test]
    async fn test_unclaimed_strike_is_counted_only() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let solver = fixture.solver(&module, ScriptedHandler::unrecognizing());

        module.raise(ModuleEvent::Strike);
        solver.process_events();

        assert_eq!(solver.strike_count(), 1);
        assert!(fixture.scoreboard.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fake_strike_announces_without_counting() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let solver = fixture.solver(&module, ScriptedHandler::unrecognizing());
        solver.set_claimant(Some(Identity::new("carol")));

        module.raise(ModuleEvent::FakeStrike);
        solver.process_events();

        assert_eq!(solver.strike_count(), 0);
        assert_eq!(fixture.chat.messages().len(), 1);
        assert!(fixture.scoreboard.calls().is_empty());
        assert!(fixture.scoreboard.log().is_empty());
    }

    #[tokio::test]
    async fn test_events_before_a_command_are_not_credited_to_it() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let solver = fixture.solver(&module, acknowledged(&[]));

        module.raise(ModuleEvent::Strike);
        solver.respond_to_command(&command("dave", "press alarm")).await;

        assert_eq!(solver.strike_count(), 1);
        assert!(fixture.scoreboard.calls().is_empty());
    }

    #[tokio::test]
    async fn test_time_mode_solve_adds_time() {
        let fixture = Fixture::new().with_modes(GameModes {
            time_mode: true,
            zen_mode: false,
        });
        let module = fixture.module(wires());
        let solver = fixture.solver(
            &module,
            acknowledged(&[Directive::Interact(SelectableId::new("cut"))]),
        );

        solver.respond_to_command(&command("dave", "cut")).await;

        assert!(fixture.bomb.calls().contains(&BombCall::SetTime(345.0)));
        assert!(
            fixture
                .chat
                .messages()
                .contains(&"Bomb time increased by 45.0 seconds!".to_owned())
        );
    }

    #[tokio::test]
    async fn test_queued_turn_waits_for_solve_and_command() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let solver = fixture.solver(
            &module,
            acknowledged(&[Directive::Interact(SelectableId::new("cut"))]),
        );
        solver.queue_turn();

        let cut = command("dave", "cut");
        let (turned, outcome) = tokio::join!(
            solver.turn_bomb_on_solve(),
            solver.respond_to_command(&cut)
        );

        assert!(turned);
        assert_eq!(outcome, DispatchOutcome::Completed { responded: true });
        let calls = fixture.bomb.calls();
        let defocus = calls
            .iter()
            .position(|call| *call == BombCall::Defocus("7".to_owned()))
            .unwrap();
        let turn = calls
            .iter()
            .position(|call| *call == BombCall::TurnBomb)
            .unwrap();
        assert!(turn > defocus);
    }

    #[tokio::test]
    async fn test_cancelled_turn_does_not_turn() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let solver = fixture.solver(&module, ScriptedHandler::unrecognizing());
        solver.queue_turn();
        solver.cancel_turn();

        assert!(!solver.turn_bomb_on_solve().await);
        assert!(!fixture.bomb.calls().contains(&BombCall::TurnBomb));
    }

    #[test]
    fn test_abandoned_modules_come_from_handler() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let solver = fixture.solver(
            &module,
            ScriptedHandler::unrecognizing().with_abandoned_modules(&["timer"]),
        );

        assert_eq!(solver.abandoned_modules(), vec!["timer"]);
    }

    #[test]
    fn test_request_cancel_reaches_handler() {
        let fixture = Fixture::new();
        let module = fixture.module(wires());
        let handler = ScriptedHandler::unrecognizing();
        let solver = fixture.solver(&module, handler.clone());

        solver.request_cancel();

        assert!(solver.canceller().should_cancel());
        assert_eq!(handler.cancel_requests(), vec![true]);
    }
}
