//! Shared test mocks and utilities for the chatplays dispatch engine.

mod access;
mod bomb;
mod chat;
mod clock;
mod component;
mod handler;
mod presentation;
mod scheduler;
mod scoreboard;

pub use access::StaticAccess;
pub use bomb::{BombCall, MockBombCommander, Press, ScriptedModule};
pub use chat::{ChatLine, RecordingChat};
pub use clock::FixedClock;
pub use component::{FakeComponent, FakeComponentBuilder};
pub use handler::ScriptedHandler;
pub use presentation::{CameraCall, RecordingCameras, RecordingMusic};
pub use scheduler::RecordingScheduler;
pub use scoreboard::{RecordingScoreboard, ScoreboardCall};
