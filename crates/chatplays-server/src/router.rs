//! Routes chat lines to module solvers.
//!
//! A line is `!<code> <command>`, optionally prefixed by `<nick>: `. Lines
//! without a nick belong to the console operator.

use std::collections::BTreeMap;
use std::sync::Arc;

use chatplays_core::command::{Command, ModuleCommand};
use chatplays_core::identity::Identity;
use chatplays_dispatch::{DispatchOutcome, ModuleSolver};
use tracing::{debug, instrument};

/// A chat line addressed to one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub identity: Identity,
    pub module_code: String,
    pub text: String,
}

/// Splits a chat line into sender, module code and command text.
///
/// Returns `None` for lines that are not module commands.
#[must_use]
pub fn parse_line(line: &str, operator: &Identity) -> Option<ParsedLine> {
    let line = line.trim();
    let (identity, body) = match line.split_once(':') {
        Some((nick, rest)) if !nick.trim().is_empty() && !nick.contains('!') => {
            (Identity::new(nick.trim()), rest.trim_start())
        }
        _ => (operator.clone(), line),
    };

    let body = body.strip_prefix('!')?;
    let (code, text) = body.split_once(char::is_whitespace)?;
    let text = text.trim();
    if code.is_empty() || text.is_empty() {
        return None;
    }

    Some(ParsedLine {
        identity,
        module_code: code.to_owned(),
        text: text.to_owned(),
    })
}

/// What became of a routed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The line was not a module command.
    NotACommand,
    /// No module on the bomb has the code.
    UnknownModule,
    /// The module's solver handled the command.
    Dispatched(DispatchOutcome),
}

/// Module solvers of one bomb, keyed by code.
pub struct Router {
    operator: Identity,
    solvers: BTreeMap<String, Arc<ModuleSolver>>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("operator", &self.operator)
            .field("codes", &self.solvers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Router {
    #[must_use]
    pub fn new(operator: Identity) -> Self {
        Self {
            operator,
            solvers: BTreeMap::new(),
        }
    }

    /// Adds a solver under its module code, replacing any solver with the
    /// same code.
    pub fn insert(&mut self, solver: Arc<ModuleSolver>) {
        self.solvers.insert(solver.code().to_owned(), solver);
    }

    /// The solver for `code`.
    #[must_use]
    pub fn solver(&self, code: &str) -> Option<&Arc<ModuleSolver>> {
        self.solvers.get(code)
    }

    /// Every solver, ordered by code.
    pub fn solvers(&self) -> impl Iterator<Item = &Arc<ModuleSolver>> {
        self.solvers.values()
    }

    /// Parses `line` and hands it to the addressed module.
    #[instrument(skip(self))]
    pub async fn route(&self, line: &str) -> RouteOutcome {
        let Some(parsed) = parse_line(line, &self.operator) else {
            return RouteOutcome::NotACommand;
        };
        let Some(solver) = self.solvers.get(&parsed.module_code) else {
            debug!(module = %parsed.module_code, "no module with that code");
            return RouteOutcome::UnknownModule;
        };

        let command = ModuleCommand::new(parsed.module_code, parsed.identity, parsed.text);
        debug!(
            command_type = command.command_type(),
            correlation_id = %command.correlation_id,
            identity = %command.identity,
            "routing command"
        );
        RouteOutcome::Dispatched(solver.respond_to_command(&command).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operator() -> Identity {
        Identity::new("streamer")
    }

    #[test]
    fn test_parses_operator_line() {
        assert_eq!(
            parse_line("!3 cut 2", &operator()),
            Some(ParsedLine {
                identity: operator(),
                module_code: "3".to_owned(),
                text: "cut 2".to_owned(),
            })
        );
    }

    #[test]
    fn test_parses_nick_prefix() {
        assert_eq!(
            parse_line("  alice:   !12   press 1 2  ", &operator()),
            Some(ParsedLine {
                identity: Identity::new("alice"),
                module_code: "12".to_owned(),
                text: "press 1 2".to_owned(),
            })
        );
    }

    #[test]
    fn test_colon_inside_command_is_not_a_nick() {
        let parsed = parse_line("!4 sendtochat a: b", &operator()).unwrap();
        assert_eq!(parsed.identity, operator());
        assert_eq!(parsed.text, "sendtochat a: b");
    }

    #[test]
    fn test_rejects_non_commands() {
        assert_eq!(parse_line("hello there", &operator()), None);
        assert_eq!(parse_line("alice: hi", &operator()), None);
        assert_eq!(parse_line("!3", &operator()), None);
        assert_eq!(parse_line("! cut 1", &operator()), None);
        assert_eq!(parse_line("", &operator()), None);
    }

    #[tokio::test]
    async fn test_route_without_solvers() {
        let router = Router::new(operator());

        assert_eq!(router.route("chatter").await, RouteOutcome::NotACommand);
        assert_eq!(router.route("!9 cut 1").await, RouteOutcome::UnknownModule);
    }
}
