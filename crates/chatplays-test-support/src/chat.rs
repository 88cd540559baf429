//! Test chat: records outbound messages.

use std::sync::Mutex;

use chatplays_core::chat::ChatSink;
use chatplays_core::identity::Identity;

/// One outbound chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatLine {
    Message(String),
    Error { identity: String, text: String },
    Invalid { identity: String },
}

/// A chat sink that records every line it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingChat {
    lines: Mutex<Vec<ChatLine>>,
}

impl RecordingChat {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every line sent so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn lines(&self) -> Vec<ChatLine> {
        self.lines.lock().unwrap().clone()
    }

    /// Plain messages only.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn messages(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|line| match line {
                ChatLine::Message(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn push(&self, line: ChatLine) {
        self.lines.lock().unwrap().push(line);
    }
}

impl ChatSink for RecordingChat {
    fn send_message(&self, text: &str) {
        self.push(ChatLine::Message(text.to_owned()));
    }

    fn command_error(&self, identity: &Identity, text: &str) {
        self.push(ChatLine::Error {
            identity: identity.as_str().to_owned(),
            text: text.to_owned(),
        });
    }

    fn command_invalid(&self, identity: &Identity) {
        self.push(ChatLine::Invalid {
            identity: identity.as_str().to_owned(),
        });
    }
}
