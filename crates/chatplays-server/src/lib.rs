//! Chatplays server: console host for the dispatch engine.
//!
//! Reads chat lines, routes `!<code> <command>` to the module solvers of a
//! simulated bomb and prints chat output. Descriptor changes are written
//! back to the JSON store on exit.

pub mod config;
pub mod console;
pub mod error;
pub mod router;
pub mod sim;
pub mod state;
