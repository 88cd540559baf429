//! Discovery of the command-entry-point convention on third-party modules.
//!
//! A module that was not built against the engine can still take commands
//! by exposing `ProcessTwitchCommand(string)` on one of its components,
//! plus any of a set of optional, conventionally named fields. This module
//! scans a [`ModuleInstance`] once and records what it found.

use std::fmt;
use std::sync::Arc;

use chatplays_core::error::SurfaceError;
use chatplays_core::surface::{
    ComponentSurface, FieldKind, FieldSig, FieldValue, MethodSig, ParamType, ReturnShape,
};
use tracing::debug;

use crate::domain::binding::{CommandProtocol, ConventionFields, EntryPoint, HandlerBinding};
use crate::domain::descriptor::{ModuleDescriptor, StatusLight};
use crate::domain::instance::ModuleInstance;

pub const PROCESS_COMMAND: &str = "ProcessTwitchCommand";
pub const FORCED_SOLVE: &str = "TwitchHandleForcedSolve";
pub const HELP_MESSAGE: &str = "TwitchHelpMessage";
pub const MANUAL_CODE: &str = "TwitchManualCode";
pub const MODULE_SCORE: &str = "TwitchModuleScore";
pub const STRIKE_PENALTY: &str = "TwitchStrikePenalty";
pub const VALID_COMMANDS: &str = "TwitchValidCommands";
pub const SHOULD_CANCEL: &str = "TwitchShouldCancelCommand";
pub const ZEN_MODE: [&str; 2] = ["TwitchZenMode", "ZenModeActive"];
pub const TIME_MODE: [&str; 2] = ["TwitchTimeMode", "TimeModeActive"];
pub const ABANDON_MODULE: &str = "TwitchAbandonModule";
pub const PLAYS_ACTIVE: &str = "TwitchPlaysActive";
pub const SKIP_TIME_ALLOWED: &str = "TwitchPlaysSkipTimeAllowed";

/// Why a `ProcessTwitchCommand` candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPointRejection {
    TooFewParameters,
    TooManyParameters,
    WrongParameterType(ParamType),
    UnsupportedReturn(ReturnShape),
}

impl fmt::Display for EntryPointRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewParameters => f.write_str("too few parameters"),
            Self::TooManyParameters => f.write_str("too many parameters"),
            Self::WrongParameterType(param) => {
                write!(f, "expected a single text parameter, got {param:?}")
            }
            Self::UnsupportedReturn(shape) => write!(f, "unsupported return shape {shape:?}"),
        }
    }
}

/// Checks a candidate entry point and picks its protocol.
///
/// # Errors
///
/// Returns the reason the signature does not fit the convention.
pub fn validate_entry_point(sig: &MethodSig) -> Result<CommandProtocol, EntryPointRejection> {
    match sig.params.as_slice() {
        [] => return Err(EntryPointRejection::TooFewParameters),
        [ParamType::Text] => {}
        [other] => return Err(EntryPointRejection::WrongParameterType(other.clone())),
        _ => return Err(EntryPointRejection::TooManyParameters),
    }
    match &sig.returns {
        ReturnShape::Selectables => Ok(CommandProtocol::Simple),
        ReturnShape::Coroutine => Ok(CommandProtocol::Coroutine),
        other => Err(EntryPointRejection::UnsupportedReturn(other.clone())),
    }
}

/// What a scan found on one module instance.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub binding: HandlerBinding,
    pub help_text: Option<String>,
    pub manual_code: Option<String>,
    pub module_score: Option<i32>,
    pub strike_penalty: Option<i32>,
    pub valid_commands: Option<Vec<String>>,
    pub status_light: Option<StatusLight>,
}

impl Discovery {
    /// Whether a usable command entry point was found.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.binding.entry_point.is_some()
    }

    /// The descriptor a fresh discovery declares for this module.
    #[must_use]
    pub fn declared(&self, module_id: &str, display_name: &str) -> ModuleDescriptor {
        let mut declared = ModuleDescriptor::new(module_id);
        self.apply_to(&mut declared, display_name);
        declared
    }

    /// Writes discovered values into `descriptor`, skipping overridden
    /// fields. Returns whether anything changed.
    pub fn apply_to(&self, descriptor: &mut ModuleDescriptor, display_name: &str) -> bool {
        let before = descriptor.clone();

        if let Some(help) = &self.help_text
            && !descriptor.help_text_override
        {
            descriptor.help_text = Some(help.clone());
        }
        if let Some(manual) = &self.manual_code
            && !descriptor.manual_code_override
        {
            descriptor.manual_code = Some(manual.clone());
        }
        if let Some(light) = self.status_light
            && !descriptor.status_light_override
        {
            descriptor.status_light = light;
        }
        if let Some(score) = self.module_score
            && !descriptor.score_override
        {
            descriptor.score = score;
        }
        if let Some(penalty) = self.strike_penalty
            && !descriptor.strike_penalty_override
        {
            descriptor.strike_penalty = penalty;
        }
        if !descriptor.valid_commands_override {
            descriptor.valid_commands.clone_from(&self.valid_commands);
        }
        descriptor.cancellable |= self.binding.fields.cancel.is_some();
        descriptor.display_name = Some(display_name.to_owned());

        *descriptor != before
    }
}

/// Scans `instance` for the command convention.
///
/// # Errors
///
/// Returns a [`SurfaceError`] if a convention field exists but cannot be
/// read.
pub fn introspect(instance: &ModuleInstance) -> Result<Discovery, SurfaceError> {
    let entry_point = find_entry_point(&instance.components);
    let forced_solve = find_forced_solve(
        entry_point.as_ref().map(|e| &e.component),
        &instance.components,
    );
    let field_owner = entry_point
        .as_ref()
        .map(|e| Arc::clone(&e.component))
        .or_else(|| forced_solve.clone());

    let mut discovery = Discovery {
        binding: HandlerBinding {
            entry_point,
            forced_solve,
            field_owner: field_owner.clone(),
            fields: ConventionFields::default(),
        },
        help_text: None,
        manual_code: None,
        module_score: None,
        strike_penalty: None,
        valid_commands: None,
        status_light: None,
    };

    if let Some(owner) = field_owner {
        read_convention_fields(owner.as_ref(), &mut discovery)?;
    }

    discovery.status_light = instance
        .status_light_position
        .map(|(x, z)| StatusLight::from_local_position(x, z));
    match discovery.status_light {
        Some(light) => debug!(module_type = %instance.module_type, corner = %light, "status light found"),
        None => debug!(module_type = %instance.module_type, "status light not found"),
    }

    Ok(discovery)
}

fn find_entry_point(components: &[Arc<dyn ComponentSurface>]) -> Option<EntryPoint> {
    for component in components {
        let type_name = &component.type_info().full_name;
        let Some(candidate) = component
            .methods()
            .into_iter()
            .find(|m| m.name == PROCESS_COMMAND)
        else {
            continue;
        };

        match validate_entry_point(&candidate) {
            Ok(protocol) => {
                debug!(component = %type_name, ?protocol, "found command entry point");
                return Some(EntryPoint {
                    component: Arc::clone(component),
                    method: candidate.name,
                    protocol,
                });
            }
            Err(rejection) => {
                debug!(
                    component = %type_name,
                    %rejection,
                    "rejected candidate command entry point"
                );
            }
        }
    }
    None
}

fn is_forced_solve(sig: &MethodSig) -> bool {
    sig.name == FORCED_SOLVE
        && sig.params.is_empty()
        && matches!(sig.returns, ReturnShape::Unit | ReturnShape::Coroutine)
}

fn find_forced_solve(
    command_component: Option<&Arc<dyn ComponentSurface>>,
    components: &[Arc<dyn ComponentSurface>],
) -> Option<Arc<dyn ComponentSurface>> {
    if let Some(component) = command_component
        && component.methods().iter().any(is_forced_solve)
    {
        return Some(Arc::clone(component));
    }
    components
        .iter()
        .find(|c| c.methods().iter().any(is_forced_solve))
        .cloned()
}

fn field_named(fields: &[FieldSig], names: &[&str], kind: &FieldKind) -> Option<String> {
    names.iter().find_map(|name| {
        fields
            .iter()
            .find(|f| f.name == *name && f.kind == *kind)
            .map(|f| f.name.clone())
    })
}

fn read_convention_fields(
    owner: &dyn ComponentSurface,
    discovery: &mut Discovery,
) -> Result<(), SurfaceError> {
    let declared = owner.fields();
    let fields = ConventionFields {
        help_text: field_named(&declared, &[HELP_MESSAGE], &FieldKind::Text),
        manual_code: field_named(&declared, &[MANUAL_CODE], &FieldKind::Text),
        module_score: field_named(&declared, &[MODULE_SCORE], &FieldKind::Int),
        strike_penalty: field_named(&declared, &[STRIKE_PENALTY], &FieldKind::Int),
        cancel: field_named(&declared, &[SHOULD_CANCEL], &FieldKind::Bool),
        valid_commands: field_named(&declared, &[VALID_COMMANDS], &FieldKind::TextList),
        zen_mode: field_named(&declared, &ZEN_MODE, &FieldKind::Bool),
        time_mode: field_named(&declared, &TIME_MODE, &FieldKind::Bool),
        abandon_modules: field_named(&declared, &[ABANDON_MODULE], &FieldKind::ModuleList),
        plays_active: field_named(&declared, &[PLAYS_ACTIVE], &FieldKind::Bool),
        skip_time_allowed: field_named(&declared, &[SKIP_TIME_ALLOWED], &FieldKind::Bool),
    };

    if let Some(name) = &fields.help_text {
        discovery.help_text = read_text(owner, name)?;
    }
    if let Some(name) = &fields.manual_code {
        discovery.manual_code = read_text(owner, name)?;
    }
    if let Some(name) = &fields.module_score {
        discovery.module_score = read_int(owner, name)?;
    }
    if let Some(name) = &fields.strike_penalty {
        discovery.strike_penalty = read_int(owner, name)?;
    }
    if let Some(name) = &fields.valid_commands {
        discovery.valid_commands = match owner.read_field(name)? {
            FieldValue::TextList(list) => list,
            _ => None,
        };
    }

    discovery.binding.fields = fields;
    Ok(())
}

fn read_text(owner: &dyn ComponentSurface, name: &str) -> Result<Option<String>, SurfaceError> {
    Ok(match owner.read_field(name)? {
        FieldValue::Text(text) => text,
        _ => None,
    })
}

fn read_int(owner: &dyn ComponentSurface, name: &str) -> Result<Option<i32>, SurfaceError> {
    Ok(match owner.read_field(name)? {
        FieldValue::Int(value) => Some(value),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use chatplays_core::surface::Invocation;
    use chatplays_test_support::FakeComponent;

    use super::*;

    fn entry(params: Vec<ParamType>, returns: ReturnShape) -> MethodSig {
        MethodSig::new(PROCESS_COMMAND, params, returns)
    }

    #[test]
    fn test_validate_entry_point_protocols() {
        assert_eq!(
            validate_entry_point(&entry(vec![ParamType::Text], ReturnShape::Selectables)),
            Ok(CommandProtocol::Simple)
        );
        assert_eq!(
            validate_entry_point(&entry(vec![ParamType::Text], ReturnShape::Coroutine)),
            Ok(CommandProtocol::Coroutine)
        );
    }

    #[test]
    fn test_validate_entry_point_rejections() {
        assert_eq!(
            validate_entry_point(&entry(vec![], ReturnShape::Coroutine)),
            Err(EntryPointRejection::TooFewParameters)
        );
        assert_eq!(
            validate_entry_point(&entry(
                vec![ParamType::Text, ParamType::Int],
                ReturnShape::Coroutine
            )),
            Err(EntryPointRejection::TooManyParameters)
        );
        assert_eq!(
            validate_entry_point(&entry(vec![ParamType::Int], ReturnShape::Coroutine)),
            Err(EntryPointRejection::WrongParameterType(ParamType::Int))
        );
        assert_eq!(
            validate_entry_point(&entry(vec![ParamType::Text], ReturnShape::Unit)),
            Err(EntryPointRejection::UnsupportedReturn(ReturnShape::Unit))
        );
    }

    #[test]
    fn test_scan_skips_invalid_candidates() {
        let broken = FakeComponent::builder("Mods.Broken")
            .method(entry(vec![ParamType::Int], ReturnShape::Coroutine))
            .build();
        let good = FakeComponent::builder("Mods.Good")
            .coroutine_entry(|_| Invocation::Coroutine(None))
            .build();
        let instance = ModuleInstance::new("good", "Good")
            .with_component(broken)
            .with_component(good);

        let discovery = introspect(&instance).unwrap();
        let entry_point = discovery.binding.entry_point.unwrap();
        assert_eq!(entry_point.component.type_info().full_name, "Mods.Good");
        assert_eq!(entry_point.protocol, CommandProtocol::Coroutine);
    }

    #[test]
    fn test_convention_fields_are_read_by_name_and_type() {
        let component = FakeComponent::builder("Mods.ColorGenerator")
            .simple_entry(|_| Invocation::Selectables(None))
            .field(HELP_MESSAGE, FieldValue::Text(Some("!{0} submit".to_owned())))
            .field(MANUAL_CODE, FieldValue::Text(Some("Color%20Generator".to_owned())))
            .field(MODULE_SCORE, FieldValue::Int(7))
            .field(STRIKE_PENALTY, FieldValue::Int(-3))
            .field(
                VALID_COMMANDS,
                FieldValue::TextList(Some(vec!["^submit$".to_owned()])),
            )
            .field(SHOULD_CANCEL, FieldValue::Bool(false))
            .field("ZenModeActive", FieldValue::Bool(false))
            .field_with_kind("TwitchTimeMode", FieldKind::Int, FieldValue::Int(1))
            .build();
        let instance = ModuleInstance::new("Color Generator", "Color Generator")
            .with_component(component)
            .with_status_light(-0.07, 0.07);

        let discovery = introspect(&instance).unwrap();

        assert_eq!(discovery.help_text.as_deref(), Some("!{0} submit"));
        assert_eq!(discovery.manual_code.as_deref(), Some("Color%20Generator"));
        assert_eq!(discovery.module_score, Some(7));
        assert_eq!(discovery.strike_penalty, Some(-3));
        assert_eq!(discovery.valid_commands, Some(vec!["^submit$".to_owned()]));
        assert_eq!(
            discovery.status_light,
            Some(StatusLight {
                left: true,
                bottom: false
            })
        );
        let fields = &discovery.binding.fields;
        assert_eq!(fields.cancel.as_deref(), Some(SHOULD_CANCEL));
        assert_eq!(fields.zen_mode.as_deref(), Some("ZenModeActive"));
        assert_eq!(fields.time_mode, None);
        assert_eq!(fields.abandon_modules, None);
    }

    #[test]
    fn test_missing_fields_leave_defaults() {
        let component = FakeComponent::builder("Mods.Bare")
            .coroutine_entry(|_| Invocation::Coroutine(None))
            .build();
        let instance = ModuleInstance::new("bare", "Bare").with_component(component);

        let discovery = introspect(&instance).unwrap();
        let declared = discovery.declared("bare", "Bare");

        assert_eq!(declared.score, 5);
        assert_eq!(declared.strike_penalty, -6);
        assert_eq!(declared.help_text, None);
        assert_eq!(declared.valid_commands, None);
        assert!(!declared.cancellable);
    }

    #[test]
    fn test_forced_solve_found_elsewhere_in_graph() {
        let command = FakeComponent::builder("Mods.Command")
            .coroutine_entry(|_| Invocation::Coroutine(None))
            .build();
        let solver = FakeComponent::builder("Mods.Solver")
            .forced_solve(|| Invocation::Unit)
            .build();
        let instance = ModuleInstance::new("m", "M")
            .with_component(command)
            .with_component(solver);

        let discovery = introspect(&instance).unwrap();
        let forced = discovery.binding.forced_solve.unwrap();
        assert_eq!(forced.type_info().full_name, "Mods.Solver");
    }

    #[test]
    fn test_no_entry_point_is_unsupported_but_keeps_forced_solve() {
        let solver = FakeComponent::builder("Mods.OnlySolver")
            .forced_solve(|| Invocation::Unit)
            .field(HELP_MESSAGE, FieldValue::Text(Some("none".to_owned())))
            .build();
        let instance = ModuleInstance::new("m", "M").with_component(solver);

        let discovery = introspect(&instance).unwrap();
        assert!(!discovery.is_supported());
        assert!(discovery.binding.forced_solve.is_some());
        assert_eq!(discovery.help_text.as_deref(), Some("none"));
    }

    #[test]
    fn test_unreadable_field_fails_the_scan() {
        let component = FakeComponent::builder("Mods.Faulty")
            .coroutine_entry(|_| Invocation::Coroutine(None))
            .field(MODULE_SCORE, FieldValue::Int(3))
            .failing_field(MODULE_SCORE)
            .build();
        let instance = ModuleInstance::new("faulty", "Faulty").with_component(component);

        assert!(introspect(&instance).is_err());
    }

    #[test]
    fn test_apply_respects_overrides() {
        let component = FakeComponent::builder("Mods.Scored")
            .coroutine_entry(|_| Invocation::Coroutine(None))
            .field(MODULE_SCORE, FieldValue::Int(11))
            .build();
        let instance = ModuleInstance::new("scored", "Scored").with_component(component);
        let discovery = introspect(&instance).unwrap();

        let mut stored = ModuleDescriptor {
            score: 2,
            score_override: true,
            ..ModuleDescriptor::new("scored")
        };
        assert!(discovery.apply_to(&mut stored, "Scored"));
        assert_eq!(stored.score, 2);
        assert_eq!(stored.display_name.as_deref(), Some("Scored"));
        assert!(!discovery.apply_to(&mut stored, "Scored"));
    }
}
