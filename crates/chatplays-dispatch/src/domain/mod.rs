//! Dispatch session state and command classification.

pub mod meta;
pub mod outcome;
pub mod session;
