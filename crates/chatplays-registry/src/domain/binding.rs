//! Per-instance bindings produced by introspection.

use std::fmt;
use std::sync::Arc;

use chatplays_core::surface::ComponentSurface;

/// How the command entry point returns its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandProtocol {
    /// A finite list of selectables pressed in order.
    Simple,
    /// A resumable sequence of raw values.
    Coroutine,
}

/// Names of the convention fields found on the command component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConventionFields {
    pub help_text: Option<String>,
    pub manual_code: Option<String>,
    pub module_score: Option<String>,
    pub strike_penalty: Option<String>,
    pub cancel: Option<String>,
    pub valid_commands: Option<String>,
    pub zen_mode: Option<String>,
    pub time_mode: Option<String>,
    pub abandon_modules: Option<String>,
    pub plays_active: Option<String>,
    pub skip_time_allowed: Option<String>,
}

/// The module's command entry point.
#[derive(Clone)]
pub struct EntryPoint {
    pub component: Arc<dyn ComponentSurface>,
    pub method: String,
    pub protocol: CommandProtocol,
}

/// Everything the generic handler needs to drive one module instance.
#[derive(Clone)]
pub struct HandlerBinding {
    /// `None` when only a forced-solve routine was found.
    pub entry_point: Option<EntryPoint>,
    /// Component that owns `TwitchHandleForcedSolve`.
    pub forced_solve: Option<Arc<dyn ComponentSurface>>,
    /// Component the convention fields live on.
    pub field_owner: Option<Arc<dyn ComponentSurface>>,
    pub fields: ConventionFields,
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_name = |c: &Arc<dyn ComponentSurface>| c.type_info().full_name.clone();
        f.debug_struct("HandlerBinding")
            .field(
                "entry_point",
                &self
                    .entry_point
                    .as_ref()
                    .map(|e| (type_name(&e.component), e.method.clone(), e.protocol)),
            )
            .field("forced_solve", &self.forced_solve.as_ref().map(type_name))
            .field("field_owner", &self.field_owner.as_ref().map(type_name))
            .field("fields", &self.fields)
            .finish()
    }
}
