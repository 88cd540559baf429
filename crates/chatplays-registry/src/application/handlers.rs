//! Generic handlers for modules bound through introspection.

use std::sync::Arc;
use std::time::Duration;

use chatplays_core::directive::{Directive, Suspend};
use chatplays_core::error::HandlerFault;
use chatplays_core::handler::{CommandHandler, HandlerKind, StepStream, directive_stream};
use chatplays_core::settings::GameModes;
use chatplays_core::surface::{ComponentSurface, FieldValue, Invocation, RawStream};
use futures::StreamExt;
use tracing::debug;

use crate::application::introspection::FORCED_SOLVE;
use crate::domain::binding::{EntryPoint, HandlerBinding};

/// Pause between presses of a simple-protocol command.
pub const SELECTABLE_PRESS_DELAY: Duration = Duration::from_millis(100);

/// Drives a module through its `ProcessTwitchCommand` entry point.
#[derive(Debug)]
pub struct IntrospectedHandler {
    binding: HandlerBinding,
}

impl IntrospectedHandler {
    /// Binds the handler and tells the module it is being driven by chat.
    #[must_use]
    pub fn new(binding: HandlerBinding, modes: GameModes) -> Self {
        let handler = Self { binding };
        let fields = &handler.binding.fields;
        handler.write_flag(fields.plays_active.as_deref(), true);
        handler.write_flag(fields.zen_mode.as_deref(), modes.zen_mode);
        handler.write_flag(fields.time_mode.as_deref(), modes.time_mode);
        handler
    }

    fn write_flag(&self, field: Option<&str>, value: bool) {
        let (Some(owner), Some(name)) = (&self.binding.field_owner, field) else {
            return;
        };
        if let Err(error) = owner.write_field(name, FieldValue::Bool(value)) {
            debug!(field = name, %error, "could not write convention flag");
        }
    }

    fn entry_point(&self) -> Option<&EntryPoint> {
        self.binding.entry_point.as_ref()
    }
}

impl CommandHandler for IntrospectedHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Introspected
    }

    fn respond(&self, command: &str) -> Result<Option<StepStream>, HandlerFault> {
        let Some(entry) = self.entry_point() else {
            return Ok(None);
        };
        let invocation = entry.component.invoke(&entry.method, Some(command))?;
        Ok(into_steps(invocation))
    }

    fn forced_solve(&self) -> Result<Option<StepStream>, HandlerFault> {
        forced_solve_steps(self.binding.forced_solve.as_ref())
    }

    fn set_cancel_requested(&self, requested: bool) {
        self.write_flag(self.binding.fields.cancel.as_deref(), requested);
    }

    fn abandoned_modules(&self) -> Vec<String> {
        let (Some(owner), Some(name)) = (
            &self.binding.field_owner,
            self.binding.fields.abandon_modules.as_deref(),
        ) else {
            return Vec::new();
        };
        match owner.read_field(name) {
            Ok(FieldValue::ModuleList(modules)) => modules,
            Ok(_) => Vec::new(),
            Err(error) => {
                debug!(field = name, %error, "could not read abandon list");
                Vec::new()
            }
        }
    }
}

/// Converts an entry-point result into a step stream.
///
/// A selectable list becomes an acknowledgement followed by one press and
/// one short pause per selectable.
fn into_steps(invocation: Invocation) -> Option<StepStream> {
    match invocation {
        Invocation::Selectables(Some(selectables)) => {
            let mut steps = Vec::with_capacity(selectables.len() * 2 + 1);
            steps.push(Directive::Suspend(Suspend::Frame));
            for selectable in selectables {
                steps.push(Directive::Interact(selectable));
                steps.push(Directive::wait(SELECTABLE_PRESS_DELAY));
            }
            Some(directive_stream(steps))
        }
        Invocation::Coroutine(Some(raw)) => Some(coroutine_steps(raw)),
        Invocation::Selectables(None) | Invocation::Coroutine(None) | Invocation::Unit => None,
    }
}

fn coroutine_steps(raw: RawStream) -> StepStream {
    raw.map(|value| value.map(Directive::from).map_err(HandlerFault::from))
        .boxed()
}

fn forced_solve_steps(
    component: Option<&Arc<dyn ComponentSurface>>,
) -> Result<Option<StepStream>, HandlerFault> {
    let Some(component) = component else {
        return Ok(None);
    };
    Ok(match component.invoke(FORCED_SOLVE, None)? {
        Invocation::Coroutine(Some(raw)) => Some(coroutine_steps(raw)),
        _ => Some(directive_stream(Vec::new())),
    })
}

/// Handler for modules with no usable entry point.
///
/// Accepts no commands. A forced-solve routine found on the module is
/// still honoured.
#[derive(Default)]
pub struct UnsupportedHandler {
    forced_solve: Option<Arc<dyn ComponentSurface>>,
}

impl UnsupportedHandler {
    /// Creates the handler, keeping any forced-solve routine.
    #[must_use]
    pub fn new(forced_solve: Option<Arc<dyn ComponentSurface>>) -> Self {
        Self { forced_solve }
    }
}

impl std::fmt::Debug for UnsupportedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnsupportedHandler")
            .field("has_forced_solve", &self.forced_solve.is_some())
            .finish()
    }
}

impl CommandHandler for UnsupportedHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Unsupported
    }

    fn respond(&self, _command: &str) -> Result<Option<StepStream>, HandlerFault> {
        Ok(None)
    }

    fn forced_solve(&self) -> Result<Option<StepStream>, HandlerFault> {
        forced_solve_steps(self.forced_solve.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use chatplays_core::directive::SelectableId;
    use chatplays_core::surface::RawValue;
    use chatplays_test_support::FakeComponent;
    use futures::stream;

    use super::*;
    use crate::application::introspection::{
        ABANDON_MODULE, PLAYS_ACTIVE, SHOULD_CANCEL, introspect,
    };
    use crate::domain::instance::ModuleInstance;

    async fn collect(stream: StepStream) -> Vec<Directive> {
        stream
            .map(|step| step.unwrap())
            .collect::<Vec<_>>()
            .await
    }

    #[tokio::test]
    async fn test_simple_protocol_presses_each_selectable() {
        let component = FakeComponent::builder("Mods.Keys")
            .simple_entry(|command| {
                Invocation::Selectables(
                    (command == "press 1 2")
                        .then(|| vec![SelectableId::new("1"), SelectableId::new("2")]),
                )
            })
            .build();
        let instance = ModuleInstance::new("keys", "Keys").with_component(component);
        let binding = introspect(&instance).unwrap().binding;
        let handler = IntrospectedHandler::new(binding, GameModes::default());

        let steps = collect(handler.respond("press 1 2").unwrap().unwrap()).await;
        assert_eq!(
            steps,
            vec![
                Directive::Suspend(Suspend::Frame),
                Directive::Interact(SelectableId::new("1")),
                Directive::wait(SELECTABLE_PRESS_DELAY),
                Directive::Interact(SelectableId::new("2")),
                Directive::wait(SELECTABLE_PRESS_DELAY),
            ]
        );
        assert!(handler.respond("dance").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_coroutine_values_are_translated() {
        let component = FakeComponent::builder("Mods.Alarm")
            .coroutine_entry(|_| {
                Invocation::Coroutine(Some(
                    stream::iter(vec![
                        Ok(RawValue::Null),
                        Ok(RawValue::Text("strike".to_owned())),
                        Ok(RawValue::Text("press".to_owned())),
                    ])
                    .boxed(),
                ))
            })
            .build();
        let instance = ModuleInstance::new("alarm", "Alarm").with_component(component);
        let handler =
            IntrospectedHandler::new(introspect(&instance).unwrap().binding, GameModes::default());

        let steps = collect(handler.respond("press alarm").unwrap().unwrap()).await;
        assert_eq!(
            steps,
            vec![
                Directive::Suspend(Suspend::Frame),
                Directive::Strike,
                Directive::value("press"),
            ]
        );
    }

    #[test]
    fn test_binding_writes_mode_flags() {
        let component = FakeComponent::builder("Mods.Flags")
            .coroutine_entry(|_| Invocation::Coroutine(None))
            .field(PLAYS_ACTIVE, FieldValue::Bool(false))
            .field("TwitchZenMode", FieldValue::Bool(false))
            .field("TimeModeActive", FieldValue::Bool(false))
            .field(SHOULD_CANCEL, FieldValue::Bool(false))
            .build();
        let instance =
            ModuleInstance::new("flags", "Flags").with_component(component.clone());
        let modes = GameModes {
            time_mode: true,
            zen_mode: false,
        };

        let handler = IntrospectedHandler::new(introspect(&instance).unwrap().binding, modes);
        assert_eq!(component.field_value(PLAYS_ACTIVE), Some(FieldValue::Bool(true)));
        assert_eq!(component.field_value("TwitchZenMode"), Some(FieldValue::Bool(false)));
        assert_eq!(component.field_value("TimeModeActive"), Some(FieldValue::Bool(true)));

        handler.set_cancel_requested(true);
        assert_eq!(component.field_value(SHOULD_CANCEL), Some(FieldValue::Bool(true)));
    }

    #[test]
    fn test_abandoned_modules_are_read_from_the_module() {
        let component = FakeComponent::builder("Mods.Souvenir")
            .coroutine_entry(|_| Invocation::Coroutine(None))
            .field(
                ABANDON_MODULE,
                FieldValue::ModuleList(vec!["Wires".to_owned()]),
            )
            .build();
        let instance = ModuleInstance::new("souvenir", "Souvenir").with_component(component);
        let handler =
            IntrospectedHandler::new(introspect(&instance).unwrap().binding, GameModes::default());

        assert_eq!(handler.abandoned_modules(), vec!["Wires".to_owned()]);
    }

    #[tokio::test]
    async fn test_unsupported_handler_only_force_solves() {
        let solver = FakeComponent::builder("Mods.Solver")
            .forced_solve(|| Invocation::Unit)
            .build();
        let handler = UnsupportedHandler::new(Some(solver.clone() as Arc<dyn ComponentSurface>));

        assert_eq!(handler.kind(), HandlerKind::Unsupported);
        assert!(handler.respond("anything").unwrap().is_none());
        let steps = collect(handler.forced_solve().unwrap().unwrap()).await;
        assert!(steps.is_empty());
        assert_eq!(solver.invocations(), vec![(FORCED_SOLVE.to_owned(), None)]);

        assert!(UnsupportedHandler::default().forced_solve().unwrap().is_none());
    }
}
