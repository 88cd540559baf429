//! Error types shared across the engine.

use thiserror::Error;

/// A fault raised while a module handler produced or stepped its sequence.
///
/// Every fault is recovered by the dispatch engine with an automatic solve;
/// none propagates to the caller.
#[derive(Debug, Error)]
pub enum HandlerFault {
    /// The handler failed with its own error message.
    #[error("handler raised: {0}")]
    Raised(String),

    /// The handler asked to be solved automatically.
    #[error("handler requested automatic solve: {0}")]
    AutoSolve(String),

    /// Reading or invoking a member on the module's component failed.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Errors from the component reflection surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The component has no member with this name.
    #[error("component {component} has no member {member}")]
    MissingMember {
        /// Full type name of the component.
        component: String,
        /// Requested member name.
        member: String,
    },

    /// The member exists but carries a different type.
    #[error("member {member} on {component} has unexpected type")]
    TypeMismatch {
        /// Full type name of the component.
        component: String,
        /// Requested member name.
        member: String,
    },

    /// Invoking a method failed inside the module.
    #[error("invocation of {method} failed: {reason}")]
    Invocation {
        /// Method name.
        method: String,
        /// Failure reported by the module.
        reason: String,
    },
}

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid YAML for the settings schema.
    #[error("failed to parse settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value is outside its allowed range.
    #[error("invalid setting: {0}")]
    Invalid(String),
}
