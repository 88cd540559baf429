//! Console implementations of the chat, scoreboard, access and presentation
//! boundaries.
//!
//! Chat goes to a line-oriented writer (stdout in the binary). Cameras and
//! music have nothing to show on a console, so they only trace.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chatplays_core::chat::ChatSink;
use chatplays_core::game::{CameraPriority, ModuleCameras, MusicPlayer};
use chatplays_core::identity::{AccessLevel, AccessOracle, Identity};
use chatplays_core::scoreboard::{LogRecord, Scoreboard};
use tracing::{debug, warn};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Chat sink that prints one line per message.
#[derive(Debug)]
pub struct ConsoleChat<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> ConsoleChat<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn line(&self, text: &str) {
        let mut out = lock(&self.out);
        if let Err(error) = writeln!(out, "{text}").and_then(|()| out.flush()) {
            warn!(%error, "failed to write chat line");
        }
    }
}

impl<W: Write + Send> ChatSink for ConsoleChat<W> {
    fn send_message(&self, text: &str) {
        self.line(text);
    }

    fn command_error(&self, identity: &Identity, text: &str) {
        self.line(&format!("@{identity}, {text}"));
    }

    fn command_invalid(&self, identity: &Identity) {
        self.line(&format!("@{identity}, invalid command."));
    }
}

/// Per-identity totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Standing {
    pub score: i32,
    pub solves: u32,
    pub strikes: u32,
}

/// Scoreboard kept in memory for the lifetime of the bomb.
#[derive(Debug, Default)]
pub struct TallyScoreboard {
    standings: Mutex<BTreeMap<Identity, Standing>>,
    log: Mutex<Vec<LogRecord>>,
}

impl TallyScoreboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Totals per identity, ordered by name.
    pub fn standings(&self) -> BTreeMap<Identity, Standing> {
        lock(&self.standings).clone()
    }

    /// Solve and strike records in the order they happened.
    pub fn log(&self) -> Vec<LogRecord> {
        lock(&self.log).clone()
    }

    /// The standings as a JSON object keyed by identity.
    pub fn standings_json(&self) -> serde_json::Value {
        let standings = lock(&self.standings);
        serde_json::Value::Object(
            standings
                .iter()
                .map(|(identity, standing)| {
                    (
                        identity.to_string(),
                        serde_json::json!({
                            "score": standing.score,
                            "solves": standing.solves,
                            "strikes": standing.strikes,
                        }),
                    )
                })
                .collect(),
        )
    }
}

impl Scoreboard for TallyScoreboard {
    fn add_score(&self, identity: &Identity, delta: i32) {
        lock(&self.standings)
            .entry(identity.clone())
            .or_default()
            .score += delta;
    }

    fn add_solve(&self, identity: &Identity) {
        lock(&self.standings)
            .entry(identity.clone())
            .or_default()
            .solves += 1;
    }

    fn add_strike(&self, identity: &Identity, count: u32) {
        lock(&self.standings)
            .entry(identity.clone())
            .or_default()
            .strikes += count;
    }

    fn append_log(&self, record: &LogRecord) {
        lock(&self.log).push(record.clone());
    }
}

/// Access oracle backed by a fixed admin list. The console operator holds
/// streamer access.
#[derive(Debug, Clone)]
pub struct ConsoleAccess {
    streamer: Identity,
    admins: HashSet<Identity>,
}

impl ConsoleAccess {
    #[must_use]
    pub fn new(streamer: &str, admins: &[String]) -> Self {
        Self {
            streamer: Identity::new(streamer),
            admins: admins.iter().map(Identity::new).collect(),
        }
    }

    fn level_of(&self, identity: &Identity) -> AccessLevel {
        if *identity == self.streamer {
            AccessLevel::Streamer
        } else if self.admins.contains(identity) {
            AccessLevel::Admin
        } else {
            AccessLevel::Defuser
        }
    }
}

impl AccessOracle for ConsoleAccess {
    fn has_access(&self, identity: &Identity, level: AccessLevel, or_higher: bool) -> bool {
        let held = self.level_of(identity);
        if or_higher { held >= level } else { held == level }
    }
}

/// Module cameras for a console: every request is traced.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCameras;

impl ModuleCameras for TracingCameras {
    fn attach(&self, module_code: &str, priority: CameraPriority) {
        debug!(module = %module_code, ?priority, "camera attached");
    }

    fn detach(&self, module_code: &str, delayed: bool) {
        debug!(module = %module_code, delayed, "camera detached");
    }

    fn hide(&self) {
        debug!("cameras hidden");
    }

    fn show(&self) {
        debug!("cameras shown");
    }

    fn hide_hud(&self) {
        debug!("hud hidden");
    }

    fn show_hud(&self) {
        debug!("hud shown");
    }

    fn update_solves(&self) {
        debug!("solve counter refreshed");
    }

    fn update_strikes(&self, flash: bool) {
        debug!(flash, "strike counter refreshed");
    }
}

/// Music player for a console: every request is traced.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMusic;

impl MusicPlayer for TracingMusic {
    fn start_random(&self) {
        debug!("waiting music started");
    }

    fn stop(&self) {
        debug!("waiting music stopped");
    }
}

#[cfg(test)]
mod tests {
    use chatplays_core::clock::Clock;
    use chatplays_core::scoreboard::LogKind;
    use chatplays_test_support::FixedClock;

    use super::*;

    #[test]
    fn test_chat_lines_are_written_in_order() {
        let chat = ConsoleChat::new(Vec::new());
        let alice = Identity::new("alice");

        chat.send_message("Module 7 (Wires) solved!");
        chat.command_error(&alice, "that command is disabled.");
        chat.command_invalid(&alice);

        let written = String::from_utf8(chat.into_inner()).unwrap();
        assert_eq!(
            written,
            "Module 7 (Wires) solved!\n@alice, that command is disabled.\n@alice, invalid command.\n"
        );
    }

    #[test]
    fn test_scoreboard_tallies_per_identity() {
        let board = TallyScoreboard::new();
        let alice = Identity::new("alice");
        let bob = Identity::new("bob");

        board.add_score(&alice, 5);
        board.add_solve(&alice);
        board.add_score(&bob, -6);
        board.add_strike(&bob, 2);

        let standings = board.standings();
        assert_eq!(
            standings[&alice],
            Standing {
                score: 5,
                solves: 1,
                strikes: 0
            }
        );
        assert_eq!(
            standings[&bob],
            Standing {
                score: -6,
                solves: 0,
                strikes: 2
            }
        );
        assert_eq!(board.standings_json()["bob"]["strikes"], 2);
    }

    #[test]
    fn test_scoreboard_keeps_log_records() {
        let board = TallyScoreboard::new();
        let record = LogRecord {
            occurred_at: FixedClock::epoch().now(),
            module_code: "3".to_owned(),
            identity: Identity::new("alice"),
            module_name: "Wires".to_owned(),
            kind: LogKind::Solve { value: 5 },
        };

        board.append_log(&record);

        assert_eq!(board.log(), vec![record]);
    }

    #[test]
    fn test_access_levels() {
        let access = ConsoleAccess::new("host", &["alice".to_owned()]);
        let host = Identity::new("host");
        let alice = Identity::new("alice");
        let bob = Identity::new("bob");

        assert!(access.has_access(&host, AccessLevel::Admin, true));
        assert!(!access.has_access(&host, AccessLevel::Admin, false));
        assert!(access.has_access(&alice, AccessLevel::Admin, true));
        assert!(!access.has_access(&alice, AccessLevel::SuperUser, true));
        assert!(!access.has_access(&bob, AccessLevel::NoPoints, false));
        assert!(access.has_access(&bob, AccessLevel::Defuser, false));
    }
}
