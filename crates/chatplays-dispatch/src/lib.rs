//! Chatplays Dispatch: the per-module command processor.
//!
//! A [`ModuleSolver`](application::solver::ModuleSolver) wraps one module's
//! handler. It is the only place chat commands enter: it runs the
//! meta-command phase, gates the handler's first step, drives the directive
//! stream against the bomb and settles solves and strikes through the
//! scoring ledger.

pub mod application;
pub mod domain;

pub use application::context::SolverContext;
pub use application::solver::ModuleSolver;
pub use application::turn::TurnCoordinator;
pub use domain::outcome::DispatchOutcome;
