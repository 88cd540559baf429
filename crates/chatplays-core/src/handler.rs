//! The uniform handler interface every module is driven through.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use futures::stream::BoxStream;

use crate::directive::Directive;
use crate::error::HandlerFault;

/// A resumable sequence of handler steps.
///
/// The first item is the handler's acknowledgement: it proves the command
/// was understood and is not interpreted as a directive.
pub type StepStream = BoxStream<'static, Result<Directive, HandlerFault>>;

/// How a module's handler was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Constructed from the built-in table.
    BuiltIn,
    /// An introspected handler wrapped by a shim.
    Shimmed,
    /// Bound through the command-entry-point convention.
    Introspected,
    /// No usable entry point; accepts no commands.
    Unsupported,
}

impl HandlerKind {
    /// Stable lowercase name for logging.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BuiltIn => "built_in",
            Self::Shimmed => "shimmed",
            Self::Introspected => "introspected",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Translates command text into a step sequence for one module.
pub trait CommandHandler: Send + Sync {
    /// How this handler was resolved.
    fn kind(&self) -> HandlerKind;

    /// Starts handling `command`.
    ///
    /// Returns `Ok(None)` when the handler does not recognize the command.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerFault`] if the handler fails before producing a
    /// sequence.
    fn respond(&self, command: &str) -> Result<Option<StepStream>, HandlerFault>;

    /// Starts the handler's own forced-solve routine, if it has one.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerFault`] if the routine fails to start.
    fn forced_solve(&self) -> Result<Option<StepStream>, HandlerFault> {
        Ok(None)
    }

    /// Mirrors the cancellation flag into the module.
    fn set_cancel_requested(&self, _requested: bool) {}

    /// Module types this module asks the bomb to stop tracking.
    fn abandoned_modules(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Wraps a finite list of steps as a [`StepStream`].
pub fn step_stream<I>(steps: I) -> StepStream
where
    I: IntoIterator<Item = Result<Directive, HandlerFault>>,
    I::IntoIter: Send + 'static,
{
    futures::stream::iter(steps).boxed()
}

/// Wraps a finite list of directives that cannot fail.
pub fn directive_stream<I>(directives: I) -> StepStream
where
    I: IntoIterator<Item = Directive>,
    I::IntoIter: Send + 'static,
{
    futures::stream::iter(directives).map(Ok).boxed()
}

/// Cooperative cancellation flag shared with the outer coordinator.
///
/// The engine never preempts a handler; a handler observes the flag by
/// producing [`Directive::TryCancel`].
#[derive(Debug, Clone, Default)]
pub struct CommandCanceller(Arc<AtomicBool>);

impl CommandCanceller {
    /// Creates a flag that is not set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn should_cancel(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Requests cancellation.
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Clears the flag.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}
