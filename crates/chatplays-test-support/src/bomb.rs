//! Test bomb: a scripted commander and scripted modules.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chatplays_core::directive::{Rotation, SelectableId};
use chatplays_core::error::HandlerFault;
use chatplays_core::game::{BombCommander, BombModule, ModuleEvent};
use tokio::sync::mpsc::UnboundedSender;

/// One call made against the bomb.
#[derive(Debug, Clone, PartialEq)]
pub enum BombCall {
    Focus(String),
    Defocus(String),
    RotateModule(Rotation),
    RotateCamera(String, Rotation),
    Explosion { reason: String, module_name: String },
    HideUi,
    ShowUi,
    TurnBomb,
    RemoveSolveBased,
    ResetStrikes,
    SetTime(f32),
}

/// A bomb with settable counters that records every call.
#[derive(Debug)]
pub struct MockBombCommander {
    calls: Mutex<Vec<BombCall>>,
    strike_limit: AtomicU32,
    strike_count: AtomicU32,
    solvable: AtomicU32,
    solved: AtomicU32,
    multi_decker: AtomicBool,
    timer: Mutex<f32>,
}

impl Default for MockBombCommander {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            strike_limit: AtomicU32::new(3),
            strike_count: AtomicU32::new(0),
            solvable: AtomicU32::new(11),
            solved: AtomicU32::new(0),
            multi_decker: AtomicBool::new(false),
            timer: Mutex::new(300.0),
        }
    }
}

impl MockBombCommander {
    /// A two-faced bomb with three strikes, eleven solvable modules and five
    /// minutes on the timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_strike_limit(self, limit: u32) -> Self {
        self.strike_limit.store(limit, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn with_solvable_modules(self, count: u32) -> Self {
        self.solvable.store(count, Ordering::SeqCst);
        self
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_timer(self, seconds: f32) -> Self {
        *self.timer.lock().unwrap() = seconds;
        self
    }

    #[must_use]
    pub fn multi_decker(self) -> Self {
        self.multi_decker.store(true, Ordering::SeqCst);
        self
    }

    /// Counts one strike on the bomb.
    pub fn add_strike(&self) {
        self.strike_count.fetch_add(1, Ordering::SeqCst);
    }

    /// Overwrites the bomb's strike counter.
    pub fn set_strike_count(&self, count: u32) {
        self.strike_count.store(count, Ordering::SeqCst);
    }

    /// Number of solves recorded.
    #[must_use]
    pub fn solved_modules(&self) -> u32 {
        self.solved.load(Ordering::SeqCst)
    }

    /// Returns a snapshot of every call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<BombCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: BombCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl BombCommander for MockBombCommander {
    async fn focus(&self, module_code: &str) {
        self.record(BombCall::Focus(module_code.to_owned()));
    }

    async fn defocus(&self, module_code: &str) {
        self.record(BombCall::Defocus(module_code.to_owned()));
    }

    fn rotate_by_local(&self, rotation: Rotation) {
        self.record(BombCall::RotateModule(rotation));
    }

    fn rotate_camera_by_local(&self, module_code: &str, rotation: Rotation) {
        self.record(BombCall::RotateCamera(module_code.to_owned(), rotation));
    }

    fn strike_limit(&self) -> u32 {
        self.strike_limit.load(Ordering::SeqCst)
    }

    fn strike_count(&self) -> u32 {
        self.strike_count.load(Ordering::SeqCst)
    }

    fn reset_strike_count(&self) {
        self.strike_count.store(0, Ordering::SeqCst);
        self.record(BombCall::ResetStrikes);
    }

    fn is_multi_decker(&self) -> bool {
        self.multi_decker.load(Ordering::SeqCst)
    }

    fn solvable_modules(&self) -> u32 {
        self.solvable.load(Ordering::SeqCst)
    }

    fn record_solve(&self) {
        self.solved.fetch_add(1, Ordering::SeqCst);
    }

    fn current_timer(&self) -> f32 {
        *self.timer.lock().unwrap()
    }

    fn set_time_remaining(&self, seconds: f32) {
        *self.timer.lock().unwrap() = seconds;
        self.record(BombCall::SetTime(seconds));
    }

    fn cause_explosion(&self, reason: &str, module_name: &str) {
        self.record(BombCall::Explosion {
            reason: reason.to_owned(),
            module_name: module_name.to_owned(),
        });
    }

    async fn hide_main_ui(&self) {
        self.record(BombCall::HideUi);
    }

    async fn show_main_ui(&self) {
        self.record(BombCall::ShowUi);
    }

    async fn turn_bomb(&self) {
        self.record(BombCall::TurnBomb);
    }

    fn remove_solve_based_modules(&self) {
        self.record(BombCall::RemoveSolveBased);
    }
}

/// What pressing a scripted selectable does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    Nothing,
    Strike,
    Solve,
    FakeStrike,
}

/// A module whose selectables have scripted outcomes.
///
/// Pressing an unknown selectable fails, which lets tests drive the fault
/// path.
#[derive(Debug)]
pub struct ScriptedModule {
    module_type: String,
    display_name: String,
    needy: bool,
    presses: HashMap<String, Press>,
    solved: AtomicBool,
    bomb: Option<Arc<MockBombCommander>>,
    events: Mutex<Option<UnboundedSender<ModuleEvent>>>,
    pressed: Mutex<Vec<String>>,
    force_passes: AtomicU32,
}

impl ScriptedModule {
    #[must_use]
    pub fn new(module_type: &str, display_name: &str) -> Self {
        Self {
            module_type: module_type.to_owned(),
            display_name: display_name.to_owned(),
            needy: false,
            presses: HashMap::new(),
            solved: AtomicBool::new(false),
            bomb: None,
            events: Mutex::new(None),
            pressed: Mutex::new(Vec::new()),
            force_passes: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn needy(mut self) -> Self {
        self.needy = true;
        self
    }

    /// Scripts the outcome of pressing `selectable`.
    #[must_use]
    pub fn press(mut self, selectable: &str, outcome: Press) -> Self {
        self.presses.insert(selectable.to_owned(), outcome);
        self
    }

    /// Strikes also count on `bomb`.
    #[must_use]
    pub fn on_bomb(mut self, bomb: Arc<MockBombCommander>) -> Self {
        self.bomb = Some(bomb);
        self
    }

    /// Selectables pressed so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn pressed(&self) -> Vec<String> {
        self.pressed.lock().unwrap().clone()
    }

    /// Number of forced passes.
    #[must_use]
    pub fn force_passes(&self) -> u32 {
        self.force_passes.load(Ordering::SeqCst)
    }

    /// Raises an event as if the module produced it on its own.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn raise(&self, event: ModuleEvent) {
        match event {
            ModuleEvent::Pass => self.solved.store(true, Ordering::SeqCst),
            ModuleEvent::Strike => {
                if let Some(bomb) = &self.bomb {
                    bomb.add_strike();
                }
            }
            ModuleEvent::FakeStrike => {}
        }
        if let Some(events) = self.events.lock().unwrap().as_ref() {
            let _ = events.send(event);
        }
    }
}

impl BombModule for ScriptedModule {
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
        self.needy
    }

    fn interact(&self, selectable: &SelectableId) -> Result<(), HandlerFault> {
        self.pressed.lock().unwrap().push(selectable.as_str().to_owned());
        match self.presses.get(selectable.as_str()) {
            None => Err(HandlerFault::Raised(format!(
                "no selectable named {selectable}"
            ))),
            Some(Press::Nothing) => Ok(()),
            Some(Press::Strike) => {
                self.raise(ModuleEvent::Strike);
                Ok(())
            }
            Some(Press::Solve) => {
                self.raise(ModuleEvent::Pass);
                Ok(())
            }
            Some(Press::FakeStrike) => {
                self.raise(ModuleEvent::FakeStrike);
                Ok(())
            }
        }
    }

    fn force_pass(&self) {
        self.force_passes.fetch_add(1, Ordering::SeqCst);
        if !self.is_solved() {
            self.raise(ModuleEvent::Pass);
        }
    }

    fn subscribe(&self, events: UnboundedSender<ModuleEvent>) {
        *self.events.lock().unwrap() = Some(events);
    }
}
