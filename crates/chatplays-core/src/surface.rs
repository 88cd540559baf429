//! Capability surface of third-party module components.
//!
//! Modules the engine was not compiled against expose their command
//! convention through [`ComponentSurface`]: a listing of methods and fields
//! plus dynamic read, write and invoke. The registry scans this surface once
//! per module instance.

use std::time::Duration;

use futures::stream::BoxStream;

use crate::directive::{Directive, Rotation, SelectableId, Suspend};
use crate::error::SurfaceError;

/// Parameter types a method signature can declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Text,
    Int,
    Bool,
    Other(String),
}

/// What a method returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnShape {
    Unit,
    /// A finite list of selectables to press.
    Selectables,
    /// A resumable sequence of raw values.
    Coroutine,
    Other(String),
}

/// A method as listed by a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub name: String,
    pub params: Vec<ParamType>,
    pub returns: ReturnShape,
}

impl MethodSig {
    /// Builds a signature.
    #[must_use]
    pub fn new(name: impl Into<String>, params: Vec<ParamType>, returns: ReturnShape) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
        }
    }
}

/// Field types the convention recognizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Int,
    Bool,
    TextList,
    /// A list of other modules on the bomb.
    ModuleList,
    Other(String),
}

/// A field as listed by a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSig {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSig {
    /// Builds a field signature.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A field value read from or written to a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(Option<String>),
    Int(i32),
    Bool(bool),
    TextList(Option<Vec<String>>),
    /// Module type ids.
    ModuleList(Vec<String>),
}

/// Identity of a component's type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// Fully qualified type name.
    pub full_name: String,
    /// The plugin bundle that defines the type.
    pub origin: String,
}

impl TypeInfo {
    /// Builds type info.
    #[must_use]
    pub fn new(full_name: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            origin: origin.into(),
        }
    }
}

/// One value produced by a third-party coroutine.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Text(String),
    TextList(Vec<String>),
    Rotation(Rotation),
    Rotations(Vec<Rotation>),
    Wait(Duration),
}

impl From<RawValue> for Directive {
    fn from(value: RawValue) -> Self {
        match value {
            RawValue::Text(text) => Directive::from_token(&text),
            RawValue::TextList(tokens) => Directive::from_tokens(&tokens),
            RawValue::Rotation(rotation) => Directive::Rotate(rotation),
            RawValue::Rotations(rotations) => match rotations.as_slice() {
                [module, camera] => Directive::RotateWithCamera {
                    module: *module,
                    camera: *camera,
                },
                _ => Directive::Suspend(Suspend::Frame),
            },
            RawValue::Wait(duration) => Directive::wait(duration),
            RawValue::Null => Directive::Suspend(Suspend::Frame),
        }
    }
}

/// A third-party coroutine.
pub type RawStream = BoxStream<'static, Result<RawValue, SurfaceError>>;

/// Result of invoking a component method.
pub enum Invocation {
    /// A list of selectables; `None` means the command was not understood.
    Selectables(Option<Vec<SelectableId>>),
    /// A coroutine; `None` means the command was not understood.
    Coroutine(Option<RawStream>),
    Unit,
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Selectables(ids) => f.debug_tuple("Selectables").field(ids).finish(),
            Self::Coroutine(stream) => f
                .debug_tuple("Coroutine")
                .field(&stream.as_ref().map(|_| ".."))
                .finish(),
            Self::Unit => f.write_str("Unit"),
        }
    }
}

/// A component of a module instance, seen through its capabilities.
pub trait ComponentSurface: Send + Sync {
    /// The component's type.
    fn type_info(&self) -> &TypeInfo;

    /// Methods the component declares.
    fn methods(&self) -> Vec<MethodSig>;

    /// Fields the component declares.
    fn fields(&self) -> Vec<FieldSig>;

    /// Reads a field.
    ///
    /// # Errors
    ///
    /// Returns a [`SurfaceError`] if the field is missing or unreadable.
    fn read_field(&self, name: &str) -> Result<FieldValue, SurfaceError>;

    /// Writes a field.
    ///
    /// # Errors
    ///
    /// Returns a [`SurfaceError`] if the field is missing or has another type.
    fn write_field(&self, name: &str, value: FieldValue) -> Result<(), SurfaceError>;

    /// Invokes a method with an optional text argument.
    ///
    /// # Errors
    ///
    /// Returns a [`SurfaceError`] if the method is missing or fails.
    fn invoke(&self, method: &str, argument: Option<&str>) -> Result<Invocation, SurfaceError>;
}
