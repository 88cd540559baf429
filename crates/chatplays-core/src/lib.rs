//! Chatplays Core: shared abstractions.
//!
//! This crate defines the identities, the handler directive vocabulary and
//! the narrow traits behind which every external collaborator (game engine,
//! chat transport, cameras, scoreboard, scheduler) lives. It contains no
//! dispatch logic.

pub mod chat;
pub mod clock;
pub mod command;
pub mod directive;
pub mod error;
pub mod event;
pub mod game;
pub mod handler;
pub mod identity;
pub mod scheduler;
pub mod scoreboard;
pub mod settings;
pub mod surface;
