//! Registry services: introspection, resolution and the generic handlers.

pub mod handlers;
pub mod introspection;
pub mod registry;
