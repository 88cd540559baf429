//! Shims wrapped around introspected handlers.
//!
//! A shim sees every command before the module does and may answer it
//! itself. The only shim shipped here blocks commands that are legal for
//! the module but disruptive to a stream.

use chatplays_core::directive::Directive;
use chatplays_core::error::HandlerFault;
use chatplays_core::handler::{CommandHandler, HandlerKind, StepStream, directive_stream};
use regex::{Regex, RegexBuilder};
use tracing::debug;

#[derive(Debug, Clone)]
struct TrollCommand {
    pattern: Regex,
    reply: String,
}

/// Compiled troll-command patterns, shareable between shims.
#[derive(Debug, Clone, Default)]
pub struct TrollCommands(Vec<TrollCommand>);

impl TrollCommands {
    /// Compiles `(pattern, reply)` pairs. Patterns match the full command
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns the first pattern that fails to compile.
    pub fn compile(troll_commands: &[(&str, &str)]) -> Result<Self, regex::Error> {
        troll_commands
            .iter()
            .map(|(pattern, reply)| {
                Ok(TrollCommand {
                    pattern: RegexBuilder::new(pattern).case_insensitive(true).build()?,
                    reply: (*reply).to_owned(),
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()
            .map(Self)
    }
}

/// Blocks troll commands unless troll commands are enabled.
pub struct AntiTrollShim {
    inner: Box<dyn CommandHandler>,
    troll_commands: TrollCommands,
    enabled: bool,
}

impl AntiTrollShim {
    /// Wraps `inner`. Each `(pattern, reply)` pair is matched
    /// case-insensitively against the full command.
    ///
    /// # Errors
    ///
    /// Returns the first pattern that fails to compile.
    pub fn new(
        inner: Box<dyn CommandHandler>,
        troll_commands: &[(&str, &str)],
        enabled: bool,
    ) -> Result<Self, regex::Error> {
        Ok(Self::with_commands(
            inner,
            TrollCommands::compile(troll_commands)?,
            enabled,
        ))
    }

    /// Wraps `inner` with already compiled troll commands.
    #[must_use]
    pub fn with_commands(
        inner: Box<dyn CommandHandler>,
        troll_commands: TrollCommands,
        enabled: bool,
    ) -> Self {
        Self {
            inner,
            troll_commands,
            enabled,
        }
    }

    fn blocked_reply(&self, command: &str) -> Option<&str> {
        if self.enabled {
            return None;
        }
        self.troll_commands
            .0
            .iter()
            .find(|troll| troll.pattern.is_match(command.trim()))
            .map(|troll| troll.reply.as_str())
    }
}

impl CommandHandler for AntiTrollShim {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Shimmed
    }

    fn respond(&self, command: &str) -> Result<Option<StepStream>, HandlerFault> {
        if let Some(reply) = self.blocked_reply(command) {
            debug!(command, "blocked troll command");
            return Ok(Some(directive_stream([
                Directive::value("blocked"),
                Directive::SendToChatError(reply.to_owned()),
            ])));
        }
        self.inner.respond(command)
    }

    fn forced_solve(&self) -> Result<Option<StepStream>, HandlerFault> {
        self.inner.forced_solve()
    }

    fn set_cancel_requested(&self, requested: bool) {
        self.inner.set_cancel_requested(requested);
    }

    fn abandoned_modules(&self) -> Vec<String> {
        self.inner.abandoned_modules()
    }
}
