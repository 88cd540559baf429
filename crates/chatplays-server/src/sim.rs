//! A simulated bomb for the console host.
//!
//! The bomb keeps its timer, strikes and solve counter in memory. Modules
//! press scripted selectables. One built-in handler (wires) and one
//! component exposing the command-entry-point convention (keypad) cover
//! both ways a module can be driven.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chatplays_core::command::strip_prefix_ignore_case;
use chatplays_core::directive::{Directive, Rotation, SelectableId, Suspend};
use chatplays_core::error::{HandlerFault, SurfaceError};
use chatplays_core::game::{BombCommander, BombModule, ModuleEvent};
use chatplays_core::handler::{CommandHandler, HandlerKind, StepStream, directive_stream};
use chatplays_core::surface::{
    ComponentSurface, FieldKind, FieldSig, FieldValue, Invocation, MethodSig, ParamType,
    ReturnShape, TypeInfo,
};
use chatplays_registry::application::handlers::SELECTABLE_PRESS_DELAY;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct BombState {
    strikes: u32,
    strike_limit: u32,
    solvable: u32,
    solved: u32,
    timer: f32,
    explosion: Option<String>,
}

/// A bomb that lives in memory.
#[derive(Debug)]
pub struct SimBomb {
    state: Mutex<BombState>,
}

impl SimBomb {
    #[must_use]
    pub fn new(strike_limit: u32, solvable: u32, timer: f32) -> Self {
        Self {
            state: Mutex::new(BombState {
                strikes: 0,
                strike_limit,
                solvable,
                solved: 0,
                timer,
                explosion: None,
            }),
        }
    }

    /// Counts a strike made by one of the modules.
    pub fn add_strike(&self) {
        let mut state = lock(&self.state);
        state.strikes += 1;
        if state.strikes >= state.strike_limit && state.explosion.is_none() {
            state.explosion = Some("strike limit reached".to_owned());
            warn!(strikes = state.strikes, "bomb exploded");
        }
    }

    /// Sets how many modules must be solved to defuse the bomb.
    pub fn set_solvable_modules(&self, solvable: u32) {
        lock(&self.state).solvable = solvable;
    }

    /// Modules solved so far.
    pub fn solved(&self) -> u32 {
        lock(&self.state).solved
    }

    /// Why the bomb exploded, if it did.
    pub fn explosion(&self) -> Option<String> {
        lock(&self.state).explosion.clone()
    }

    /// Every solvable module is solved.
    pub fn is_defused(&self) -> bool {
        let state = lock(&self.state);
        state.solved >= state.solvable
    }
}

#[async_trait]
impl BombCommander for SimBomb {
    async fn focus(&self, module_code: &str) {
        debug!(module = %module_code, "focused module");
    }

    async fn defocus(&self, module_code: &str) {
        debug!(module = %module_code, "defocused module");
    }

    fn rotate_by_local(&self, rotation: Rotation) {
        debug!(?rotation, "rotated bomb");
    }

    fn rotate_camera_by_local(&self, module_code: &str, rotation: Rotation) {
        debug!(module = %module_code, ?rotation, "rotated camera");
    }

    fn strike_limit(&self) -> u32 {
        lock(&self.state).strike_limit
    }

    fn strike_count(&self) -> u32 {
        lock(&self.state).strikes
    }

    fn reset_strike_count(&self) {
        lock(&self.state).strikes = 0;
    }

    fn is_multi_decker(&self) -> bool {
        false
    }

    fn solvable_modules(&self) -> u32 {
        lock(&self.state).solvable
    }

    fn record_solve(&self) {
        let mut state = lock(&self.state);
        state.solved += 1;
        info!(solved = state.solved, solvable = state.solvable, "module solved");
    }

    fn current_timer(&self) -> f32 {
        lock(&self.state).timer
    }

    fn set_time_remaining(&self, seconds: f32) {
        lock(&self.state).timer = seconds;
    }

    fn cause_explosion(&self, reason: &str, module_name: &str) {
        let mut state = lock(&self.state);
        state.explosion = Some(format!("{module_name}: {reason}"));
        warn!(module_name, reason, "bomb detonated");
    }

    async fn hide_main_ui(&self) {
        debug!("main ui hidden");
    }

    async fn show_main_ui(&self) {
        debug!("main ui shown");
    }

    async fn turn_bomb(&self) {
        debug!("bomb turned");
    }

    fn remove_solve_based_modules(&self) {
        debug!("solve-based modules removed");
    }
}

/// What pressing a selectable does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Nothing,
    Strike,
    Solve,
}

/// A module whose selectables have fixed outcomes.
#[derive(Debug)]
pub struct SimModule {
    module_type: String,
    display_name: String,
    outcomes: HashMap<String, Outcome>,
    solved: AtomicBool,
    bomb: Arc<SimBomb>,
    subscribers: Mutex<Vec<UnboundedSender<ModuleEvent>>>,
}

impl SimModule {
    #[must_use]
    pub fn new(
        module_type: &str,
        display_name: &str,
        outcomes: &[(&str, Outcome)],
        bomb: Arc<SimBomb>,
    ) -> Self {
        Self {
            module_type: module_type.to_owned(),
            display_name: display_name.to_owned(),
            outcomes: outcomes
                .iter()
                .map(|(selectable, outcome)| ((*selectable).to_owned(), *outcome))
                .collect(),
            solved: AtomicBool::new(false),
            bomb,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    fn emit(&self, event: ModuleEvent) {
        lock(&self.subscribers).retain(|subscriber| subscriber.send(event).is_ok());
    }

    fn pass(&self) {
        if !self.solved.swap(true, Ordering::SeqCst) {
            self.emit(ModuleEvent::Pass);
        }
    }
}

impl BombModule for SimModule {
    fn module_type(&self) -> &str {
        &self.module_type
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn is_solved(&self) -> bool {
        self.solved.load(Ordering::SeqCst)
    }

    fn is_needy(&self) -> bool {
        false
    }

    fn interact(&self, selectable: &SelectableId) -> Result<(), HandlerFault> {
        let outcome = self
            .outcomes
            .get(selectable.as_str())
            .copied()
            .ok_or_else(|| HandlerFault::Raised(format!("no selectable named {selectable}")))?;
        debug!(module_type = %self.module_type, %selectable, ?outcome, "pressed selectable");
        match outcome {
            Outcome::Nothing => {}
            Outcome::Strike => {
                self.bomb.add_strike();
                self.emit(ModuleEvent::Strike);
            }
            Outcome::Solve => self.pass(),
        }
        Ok(())
    }

    fn force_pass(&self) {
        self.pass();
    }

    fn subscribe(&self, events: UnboundedSender<ModuleEvent>) {
        lock(&self.subscribers).push(events);
    }
}

/// Built-in handler for the wires module: `cut <n>`.
#[derive(Debug, Clone, Copy)]
pub struct WiresHandler {
    wire_count: usize,
}

impl WiresHandler {
    #[must_use]
    pub fn new(wire_count: usize) -> Self {
        Self { wire_count }
    }

    /// Selectable id of wire `n`.
    #[must_use]
    pub fn wire(n: usize) -> String {
        format!("wire {n}")
    }
}

impl CommandHandler for WiresHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::BuiltIn
    }

    fn respond(&self, command: &str) -> Result<Option<StepStream>, HandlerFault> {
        let Some(wire) = strip_prefix_ignore_case(command.trim(), "cut ")
            .and_then(|n| n.trim().parse::<usize>().ok())
            .filter(|n| (1..=self.wire_count).contains(n))
        else {
            return Ok(None);
        };
        Ok(Some(directive_stream([
            Directive::Suspend(Suspend::Frame),
            Directive::Interact(SelectableId::new(Self::wire(wire))),
            Directive::wait(SELECTABLE_PRESS_DELAY),
        ])))
    }
}

const PROCESS_COMMAND: &str = "ProcessTwitchCommand";
const FORCED_SOLVE: &str = "TwitchHandleForcedSolve";
const WRITABLE_FLAGS: [&str; 4] = [
    "TwitchPlaysActive",
    "TwitchZenMode",
    "TwitchTimeMode",
    "TwitchShouldCancelCommand",
];

/// The keypad's command component: `press <key> [<key> ...]`.
pub struct KeypadPanel {
    type_info: TypeInfo,
    module: Arc<SimModule>,
    keys: Vec<String>,
    score: i32,
    flags: Mutex<HashMap<&'static str, bool>>,
}

impl std::fmt::Debug for KeypadPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeypadPanel")
            .field("type_info", &self.type_info)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl KeypadPanel {
    #[must_use]
    pub fn new(module: Arc<SimModule>, keys: &[&str], score: i32) -> Self {
        Self {
            type_info: TypeInfo::new("DemoKeypadPanel", "DemoModules"),
            module,
            keys: keys.iter().map(|key| (*key).to_owned()).collect(),
            score,
            flags: Mutex::new(HashMap::new()),
        }
    }

    /// Selectable id of `key`.
    #[must_use]
    pub fn key(key: &str) -> String {
        format!("key {key}")
    }

    /// A flag written by the engine.
    pub fn flag(&self, name: &str) -> bool {
        lock(&self.flags).get(name).copied().unwrap_or(false)
    }

    fn presses(&self, command: &str) -> Option<Vec<SelectableId>> {
        let rest = strip_prefix_ignore_case(command.trim(), "press ")?;
        let presses = rest
            .split_whitespace()
            .map(|key| {
                self.keys
                    .iter()
                    .any(|known| known == key)
                    .then(|| SelectableId::new(Self::key(key)))
            })
            .collect::<Option<Vec<_>>>()?;
        (!presses.is_empty()).then_some(presses)
    }

    fn missing(&self, member: &str) -> SurfaceError {
        SurfaceError::MissingMember {
            component: self.type_info.full_name.clone(),
            member: member.to_owned(),
        }
    }
}

impl ComponentSurface for KeypadPanel {
    fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    fn methods(&self) -> Vec<MethodSig> {
        vec![
            MethodSig::new(PROCESS_COMMAND, vec![ParamType::Text], ReturnShape::Selectables),
            MethodSig::new(FORCED_SOLVE, Vec::new(), ReturnShape::Unit),
        ]
    }

    fn fields(&self) -> Vec<FieldSig> {
        let mut fields = vec![
            FieldSig::new("TwitchHelpMessage", FieldKind::Text),
            FieldSig::new("TwitchModuleScore", FieldKind::Int),
            FieldSig::new("TwitchValidCommands", FieldKind::TextList),
        ];
        fields.extend(
            WRITABLE_FLAGS
                .iter()
                .map(|name| FieldSig::new(*name, FieldKind::Bool)),
        );
        fields
    }

    fn read_field(&self, name: &str) -> Result<FieldValue, SurfaceError> {
        match name {
            "TwitchHelpMessage" => Ok(FieldValue::Text(Some(format!(
                "Press keys with !{{0}} press {}.",
                self.keys.join(" ")
            )))),
            "TwitchModuleScore" => Ok(FieldValue::Int(self.score)),
            "TwitchValidCommands" => Ok(FieldValue::TextList(Some(vec![
                "^press( \\w+)+$".to_owned(),
            ]))),
            _ => WRITABLE_FLAGS
                .contains(&name)
                .then(|| FieldValue::Bool(self.flag(name)))
                .ok_or_else(|| self.missing(name)),
        }
    }

    fn write_field(&self, name: &str, value: FieldValue) -> Result<(), SurfaceError> {
        let Some(flag) = WRITABLE_FLAGS.iter().find(|flag| **flag == name) else {
            return Err(self.missing(name));
        };
        let FieldValue::Bool(value) = value else {
            return Err(SurfaceError::TypeMismatch {
                component: self.type_info.full_name.clone(),
                member: name.to_owned(),
            });
        };
        lock(&self.flags).insert(*flag, value);
        Ok(())
    }

    fn invoke(&self, method: &str, argument: Option<&str>) -> Result<Invocation, SurfaceError> {
        match method {
            PROCESS_COMMAND => Ok(Invocation::Selectables(
                argument.and_then(|command| self.presses(command)),
            )),
            FORCED_SOLVE => {
                self.module.force_pass();
                Ok(Invocation::Unit)
            }
            _ => Err(self.missing(method)),
        }
    }
}
