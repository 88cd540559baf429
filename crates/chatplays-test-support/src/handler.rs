//! Test handler: answers commands from a closure.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use chatplays_core::directive::Directive;
use chatplays_core::error::HandlerFault;
use chatplays_core::handler::{CommandHandler, HandlerKind, StepStream, directive_stream, step_stream};

type Script = dyn Fn(&str) -> Option<Vec<Result<Directive, HandlerFault>>> + Send + Sync;

#[derive(Debug, Default)]
struct HandlerLog {
    commands: Mutex<Vec<String>>,
    cancel_requests: Mutex<Vec<bool>>,
    forced_solves: AtomicU32,
}

/// A handler whose step sequences come from a closure.
///
/// Clones share the call log, so a test can keep one clone and hand the
/// other to the engine.
#[derive(Clone)]
pub struct ScriptedHandler {
    kind: HandlerKind,
    script: Arc<Script>,
    respond_fault: Option<String>,
    forced_solve: Option<Vec<Directive>>,
    abandoned: Vec<String>,
    log: Arc<HandlerLog>,
}

impl std::fmt::Debug for ScriptedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedHandler")
            .field("kind", &self.kind)
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}

impl ScriptedHandler {
    /// A built-in handler answering with `script`. Returning `None` means the
    /// command was not recognized.
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&str) -> Option<Vec<Result<Directive, HandlerFault>>> + Send + Sync + 'static,
    {
        Self {
            kind: HandlerKind::BuiltIn,
            script: Arc::new(script),
            respond_fault: None,
            forced_solve: None,
            abandoned: Vec::new(),
            log: Arc::default(),
        }
    }

    /// Answers every command with the same directives.
    #[must_use]
    pub fn from_steps(steps: Vec<Directive>) -> Self {
        Self::new(move |_| Some(steps.iter().cloned().map(Ok).collect()))
    }

    /// Recognizes no command.
    #[must_use]
    pub fn unrecognizing() -> Self {
        Self::new(|_| None)
    }

    #[must_use]
    pub fn with_kind(mut self, kind: HandlerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Fails every command before producing a sequence.
    #[must_use]
    pub fn failing(mut self, message: &str) -> Self {
        self.respond_fault = Some(message.to_owned());
        self
    }

    /// Gives the handler its own forced-solve routine.
    #[must_use]
    pub fn with_forced_solve(mut self, steps: Vec<Directive>) -> Self {
        self.forced_solve = Some(steps);
        self
    }

    #[must_use]
    pub fn with_abandoned_modules(mut self, modules: &[&str]) -> Self {
        self.abandoned = modules.iter().map(|m| (*m).to_owned()).collect();
        self
    }

    /// Commands received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn commands(&self) -> Vec<String> {
        self.log.commands.lock().unwrap().clone()
    }

    /// Values mirrored into the cancel flag so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn cancel_requests(&self) -> Vec<bool> {
        self.log.cancel_requests.lock().unwrap().clone()
    }

    /// Number of forced-solve routines started.
    #[must_use]
    pub fn forced_solves(&self) -> u32 {
        self.log.forced_solves.load(Ordering::SeqCst)
    }
}

impl CommandHandler for ScriptedHandler {
    fn kind(&self) -> HandlerKind {
        self.kind
    }

    fn respond(&self, command: &str) -> Result<Option<StepStream>, HandlerFault> {
        self.log.commands.lock().unwrap().push(command.to_owned());
        if let Some(message) = &self.respond_fault {
            return Err(HandlerFault::Raised(message.clone()));
        }
        Ok((self.script)(command).map(step_stream))
    }

    fn forced_solve(&self) -> Result<Option<StepStream>, HandlerFault> {
        let Some(steps) = &self.forced_solve else {
            return Ok(None);
        };
        self.log.forced_solves.fetch_add(1, Ordering::SeqCst);
        Ok(Some(directive_stream(steps.clone())))
    }

    fn set_cancel_requested(&self, requested: bool) {
        self.log.cancel_requests.lock().unwrap().push(requested);
    }

    fn abandoned_modules(&self) -> Vec<String> {
        self.abandoned.clone()
    }
}
