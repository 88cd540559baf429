//! Test component: a scriptable [`ComponentSurface`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chatplays_core::error::SurfaceError;
use chatplays_core::surface::{
    ComponentSurface, FieldKind, FieldSig, FieldValue, Invocation, MethodSig, ParamType,
    ReturnShape, TypeInfo,
};

const PROCESS_COMMAND: &str = "ProcessTwitchCommand";
const FORCED_SOLVE: &str = "TwitchHandleForcedSolve";

type EntryFn = Box<dyn Fn(&str) -> Invocation + Send + Sync>;
type SolveFn = Box<dyn Fn() -> Invocation + Send + Sync>;

struct Field {
    sig: FieldSig,
    value: FieldValue,
}

/// A component whose methods and fields are declared by the test.
pub struct FakeComponent {
    type_info: TypeInfo,
    methods: Vec<MethodSig>,
    entry: Option<EntryFn>,
    forced_solve: Option<SolveFn>,
    fields: Mutex<Vec<Field>>,
    failing: HashSet<String>,
    invocations: Mutex<Vec<(String, Option<String>)>>,
}

impl std::fmt::Debug for FakeComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeComponent")
            .field("type_info", &self.type_info)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

impl FakeComponent {
    /// Starts declaring a component of type `full_name`.
    #[must_use]
    pub fn builder(full_name: &str) -> FakeComponentBuilder {
        FakeComponentBuilder {
            type_info: TypeInfo::new(full_name, "TestAssembly"),
            methods: Vec::new(),
            entry: None,
            forced_solve: None,
            fields: Vec::new(),
            failing: HashSet::new(),
        }
    }

    /// Current value of a declared field.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn field_value(&self, name: &str) -> Option<FieldValue> {
        self.fields
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.sig.name == name)
            .map(|f| f.value.clone())
    }

    /// Every method invocation so far, with its argument.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn invocations(&self) -> Vec<(String, Option<String>)> {
        self.invocations.lock().unwrap().clone()
    }
}

impl ComponentSurface for FakeComponent {
    fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    fn methods(&self) -> Vec<MethodSig> {
        self.methods.clone()
    }

    fn fields(&self) -> Vec<FieldSig> {
        self.fields
            .lock()
            .unwrap()
            .iter()
            .map(|f| f.sig.clone())
            .collect()
    }

    fn read_field(&self, name: &str) -> Result<FieldValue, SurfaceError> {
        if self.failing.contains(name) {
            return Err(SurfaceError::Invocation {
                method: format!("get_{name}"),
                reason: "getter threw".to_owned(),
            });
        }
        self.field_value(name)
            .ok_or_else(|| SurfaceError::MissingMember {
                component: self.type_info.full_name.clone(),
                member: name.to_owned(),
            })
    }

    fn write_field(&self, name: &str, value: FieldValue) -> Result<(), SurfaceError> {
        let mut fields = self.fields.lock().unwrap();
        let field = fields
            .iter_mut()
            .find(|f| f.sig.name == name)
            .ok_or_else(|| SurfaceError::MissingMember {
                component: self.type_info.full_name.clone(),
                member: name.to_owned(),
            })?;
        if kind_of(&value) != field.sig.kind {
            return Err(SurfaceError::TypeMismatch {
                component: self.type_info.full_name.clone(),
                member: name.to_owned(),
            });
        }
        field.value = value;
        Ok(())
    }

    fn invoke(&self, method: &str, argument: Option<&str>) -> Result<Invocation, SurfaceError> {
        self.invocations
            .lock()
            .unwrap()
            .push((method.to_owned(), argument.map(str::to_owned)));
        match (method, &self.entry, &self.forced_solve) {
            (PROCESS_COMMAND, Some(entry), _) => Ok(entry(argument.unwrap_or_default())),
            (FORCED_SOLVE, _, Some(solve)) => Ok(solve()),
            _ if self.methods.iter().any(|m| m.name == method) => Ok(Invocation::Unit),
            _ => Err(SurfaceError::MissingMember {
                component: self.type_info.full_name.clone(),
                member: method.to_owned(),
            }),
        }
    }
}

/// Declares a [`FakeComponent`].
pub struct FakeComponentBuilder {
    type_info: TypeInfo,
    methods: Vec<MethodSig>,
    entry: Option<EntryFn>,
    forced_solve: Option<SolveFn>,
    fields: Vec<Field>,
    failing: HashSet<String>,
}

impl FakeComponentBuilder {
    /// Sets the plugin bundle the type comes from.
    #[must_use]
    pub fn origin(mut self, origin: &str) -> Self {
        self.type_info.origin = origin.to_owned();
        self
    }

    /// Declares a method that does nothing when invoked.
    #[must_use]
    pub fn method(mut self, sig: MethodSig) -> Self {
        self.methods.push(sig);
        self
    }

    /// Declares a command entry point returning a coroutine.
    #[must_use]
    pub fn coroutine_entry<F>(mut self, entry: F) -> Self
    where
        F: Fn(&str) -> Invocation + Send + Sync + 'static,
    {
        self.methods.push(MethodSig::new(
            PROCESS_COMMAND,
            vec![ParamType::Text],
            ReturnShape::Coroutine,
        ));
        self.entry = Some(Box::new(entry));
        self
    }

    /// Declares a command entry point returning selectables.
    #[must_use]
    pub fn simple_entry<F>(mut self, entry: F) -> Self
    where
        F: Fn(&str) -> Invocation + Send + Sync + 'static,
    {
        self.methods.push(MethodSig::new(
            PROCESS_COMMAND,
            vec![ParamType::Text],
            ReturnShape::Selectables,
        ));
        self.entry = Some(Box::new(entry));
        self
    }

    /// Declares a forced-solve routine.
    #[must_use]
    pub fn forced_solve<F>(mut self, solve: F) -> Self
    where
        F: Fn() -> Invocation + Send + Sync + 'static,
    {
        self.methods
            .push(MethodSig::new(FORCED_SOLVE, Vec::new(), ReturnShape::Coroutine));
        self.forced_solve = Some(Box::new(solve));
        self
    }

    /// Declares a field whose kind follows its initial value.
    #[must_use]
    pub fn field(self, name: &str, value: FieldValue) -> Self {
        let kind = kind_of(&value);
        self.field_with_kind(name, kind, value)
    }

    /// Declares a field with an explicit kind.
    #[must_use]
    pub fn field_with_kind(mut self, name: &str, kind: FieldKind, value: FieldValue) -> Self {
        self.fields.push(Field {
            sig: FieldSig::new(name, kind),
            value,
        });
        self
    }

    /// Makes reads of `name` fail.
    #[must_use]
    pub fn failing_field(mut self, name: &str) -> Self {
        self.failing.insert(name.to_owned());
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<FakeComponent> {
        Arc::new(FakeComponent {
            type_info: self.type_info,
            methods: self.methods,
            entry: self.entry,
            forced_solve: self.forced_solve,
            fields: Mutex::new(self.fields),
            failing: self.failing,
            invocations: Mutex::new(Vec::new()),
        })
    }
}

fn kind_of(value: &FieldValue) -> FieldKind {
    match value {
        FieldValue::Text(_) => FieldKind::Text,
        FieldValue::Int(_) => FieldKind::Int,
        FieldValue::Bool(_) => FieldKind::Bool,
        FieldValue::TextList(_) => FieldKind::TextList,
        FieldValue::ModuleList(_) => FieldKind::ModuleList,
    }
}
