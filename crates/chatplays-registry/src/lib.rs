//! Chatplays Registry: module discovery and metadata.
//!
//! Maps a module type id to a handler-construction strategy and to the
//! [`ModuleDescriptor`](domain::descriptor::ModuleDescriptor) that tells the
//! dispatch engine how to score and treat the module. Modules without a
//! built-in handler are bound through their command-entry-point convention;
//! modules without a usable entry point get the unsupported handler.

pub mod application;
pub mod builtin;
pub mod domain;
pub mod shim;
pub mod store;

pub use application::registry::{ModuleRegistry, Resolved};
pub use domain::descriptor::ModuleDescriptor;
pub use domain::instance::ModuleInstance;
