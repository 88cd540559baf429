//! Inbound module commands.

use uuid::Uuid;

use crate::identity::Identity;

/// Prefix that forwards the rest of a command straight to the module
/// handler, bypassing the meta-command phase.
pub const SEND_TO_MODULE_PREFIX: &str = "send to module ";

/// Trait that all commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this command through the system.
    fn correlation_id(&self) -> Uuid;
}

/// One line of chat text addressed to a single module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCommand {
    /// The correlation ID for tracing; doubles as the dispatch session id.
    pub correlation_id: Uuid,
    /// The on-bomb code of the module the command targets.
    pub module_code: String,
    /// Who sent the command.
    pub identity: Identity,
    /// The raw command text, without the module code.
    pub text: String,
}

impl ModuleCommand {
    /// Creates a command with a fresh correlation ID.
    #[must_use]
    pub fn new(
        module_code: impl Into<String>,
        identity: Identity,
        text: impl Into<String>,
    ) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            module_code: module_code.into(),
            identity,
            text: text.into(),
        }
    }

    /// Returns the forwarded part of the text when it starts with
    /// `send to module ` (matched case-insensitively).
    #[must_use]
    pub fn forwarded_text(&self) -> Option<&str> {
        strip_prefix_ignore_case(&self.text, SEND_TO_MODULE_PREFIX)
    }
}

impl Command for ModuleCommand {
    fn command_type(&self) -> &'static str {
        "dispatch.module_command"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Strips `prefix` from `text`, comparing ASCII case-insensitively.
#[must_use]
pub fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_text_strips_prefix_case_insensitively() {
        let command = ModuleCommand::new("12", Identity::new("alice"), "Send To Module press 1");
        assert_eq!(command.forwarded_text(), Some("press 1"));
    }

    #[test]
    fn test_forwarded_text_is_none_without_prefix() {
        let command = ModuleCommand::new("12", Identity::new("alice"), "press 1");
        assert_eq!(command.forwarded_text(), None);
    }

    #[test]
    fn test_strip_prefix_handles_short_and_multibyte_text() {
        assert_eq!(strip_prefix_ignore_case("send", SEND_TO_MODULE_PREFIX), None);
        assert_eq!(strip_prefix_ignore_case("é", "e"), None);
    }

    #[test]
    fn test_command_type_is_stable() {
        let command = ModuleCommand::new("3", Identity::new("bob"), "view");
        assert_eq!(command.command_type(), "dispatch.module_command");
        assert_eq!(command.correlation_id(), command.correlation_id);
    }
}
