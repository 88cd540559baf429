//! The module solver and its collaborators.

pub mod context;
mod effects;
#[cfg(test)]
pub(crate) mod fixture;
mod run;
pub mod solver;
pub mod turn;
