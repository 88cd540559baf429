//! Registry domain types.

pub mod binding;
pub mod descriptor;
pub mod instance;
