//! The directive vocabulary spoken between module handlers and the
//! dispatch engine.
//!
//! Handlers produce a sequence of [`Directive`] values. Most are consumed by
//! the engine; [`Directive::Suspend`] values are passed through to the
//! scheduler as cooperative yield points. Handlers that still speak the
//! plain-text convention are translated with [`Directive::from_token`] and
//! [`Directive::from_tokens`].

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::strip_prefix_ignore_case;

/// Opaque handle of an interactable part of a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectableId(String);

impl SelectableId {
    /// Wraps a selectable name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the selectable name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SelectableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A local rotation as a unit quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Rotation {
    /// The rotation that leaves an orientation unchanged.
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Builds a rotation from Euler angles in degrees, applied Z, then X,
    /// then Y.
    #[must_use]
    pub fn from_euler_degrees(x: f32, y: f32, z: f32) -> Self {
        let (sx, cx) = (x.to_radians() * 0.5).sin_cos();
        let (sy, cy) = (y.to_radians() * 0.5).sin_cos();
        let (sz, cz) = (z.to_radians() * 0.5).sin_cos();

        Self {
            x: cy * sx * cz + sy * cx * sz,
            y: sy * cx * cz - cy * sx * sz,
            z: cy * cx * sz - sy * sx * cz,
            w: cy * cx * cz + sy * sx * sz,
        }
    }

    /// Whether this is (numerically) the identity rotation.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        const EPSILON: f32 = 1e-6;
        self.x.abs() < EPSILON
            && self.y.abs() < EPSILON
            && self.z.abs() < EPSILON
            && (self.w.abs() - 1.0).abs() < EPSILON
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Optional arguments of a detonation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetonateArgs {
    /// Explosion reason shown to chat.
    pub message: Option<String>,
    /// Module name credited with the explosion; defaults to the display name.
    pub module_name: Option<String>,
}

/// A value handed to the scheduler unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Suspend {
    /// Resume on the next frame.
    Frame,
    /// Resume after a fixed pause.
    Wait(Duration),
    /// Focus pulse produced by the `show` command.
    Show,
    /// Any other handler value.
    Value(String),
}

/// One step produced by a module handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Credit the next strike to the invoker.
    Strike,
    /// Credit the next solve to the invoker.
    Solve,
    /// Penalise the invoker for an answer the module cannot accept.
    UnsubmittablePenalty,
    /// Replace the message shown when the next strike is awarded.
    StrikeMessage(String),
    /// Abort the run and skip the final pause.
    ParseError,
    /// Abort the run if cancellation was requested.
    TryCancel,
    /// Send text to chat.
    SendToChat(String),
    /// Send text to chat as an error directed at the invoker.
    SendToChatError(String),
    /// Record a strike on the module as if it had struck itself.
    AddStrike,
    /// Keep running after strikes and attribute them in one batch.
    MultipleStrikes,
    /// Treat as a handler fault and solve the module.
    AutoSolve(String),
    /// Spend every remaining strike and explode the bomb.
    Detonate(DetonateArgs),
    /// Start ambient music for the rest of the run.
    AmbientMusic,
    /// Hide the module camera and UI for the rest of the run.
    HideCamera,
    /// Rotate the bomb face.
    Rotate(Rotation),
    /// Rotate the bomb face and the camera separately.
    RotateWithCamera {
        /// Applied to the module.
        module: Rotation,
        /// Applied to the camera.
        camera: Rotation,
    },
    /// Press and release a selectable.
    Interact(SelectableId),
    /// Pass through to the scheduler.
    Suspend(Suspend),
}

impl Directive {
    /// Translates one text value produced by a convention-following handler.
    ///
    /// Matching is ASCII case-insensitive. Text directives that take an
    /// argument need a non-blank argument; anything unrecognized passes
    /// through as [`Suspend::Value`].
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        let lower = token.to_ascii_lowercase();
        match lower.as_str() {
            "strike" => return Self::Strike,
            "solve" => return Self::Solve,
            "unsubmittablepenalty" => return Self::UnsubmittablePenalty,
            "parseerror" => return Self::ParseError,
            "trycancel" => return Self::TryCancel,
            "multiple strikes" => return Self::MultipleStrikes,
            "elevator music" | "hold music" | "waiting music" => return Self::AmbientMusic,
            "hide camera" => return Self::HideCamera,
            _ if is_detonate_verb(&lower) => return Self::Detonate(DetonateArgs::default()),
            _ => {}
        }

        if let Some(rest) = non_blank_rest(token, "strikemessage ") {
            return Self::StrikeMessage(rest.to_owned());
        }
        if let Some(rest) = non_blank_rest(token, "sendtochat ") {
            return Self::SendToChat(rest.to_owned());
        }
        if let Some(rest) = non_blank_rest(token, "sendtochaterror ") {
            return Self::SendToChatError(rest.to_owned());
        }
        if lower.starts_with("add strike") {
            return Self::AddStrike;
        }
        if lower.starts_with("autosolve") {
            return Self::AutoSolve(token.to_owned());
        }

        Self::Suspend(Suspend::Value(token.to_owned()))
    }

    /// Translates a short list of text values.
    ///
    /// A list led by `detonate` or `explode` detonates: a second element is
    /// the message, a third the module name credited with the explosion.
    /// Any other list passes through as a single space-joined value.
    #[must_use]
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let verb = tokens.first().map(|t| t.as_ref().to_ascii_lowercase());
        if verb.as_deref().is_some_and(is_detonate_verb) {
            let args = match tokens {
                [_, message] => DetonateArgs {
                    message: Some(message.as_ref().to_owned()),
                    module_name: None,
                },
                [_, message, module_name] => DetonateArgs {
                    message: Some(message.as_ref().to_owned()),
                    module_name: Some(module_name.as_ref().to_owned()),
                },
                _ => DetonateArgs::default(),
            };
            return Self::Detonate(args);
        }

        let joined = tokens
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(" ");
        Self::Suspend(Suspend::Value(joined))
    }

    /// Shorthand for a timed pause.
    #[must_use]
    pub fn wait(duration: Duration) -> Self {
        Self::Suspend(Suspend::Wait(duration))
    }

    /// Shorthand for a pass-through value.
    #[must_use]
    pub fn value(text: impl Into<String>) -> Self {
        Self::Suspend(Suspend::Value(text.into()))
    }
}

fn is_detonate_verb(lower: &str) -> bool {
    matches!(lower, "detonate" | "explode")
}

fn non_blank_rest<'a>(token: &'a str, prefix: &str) -> Option<&'a str> {
    strip_prefix_ignore_case(token, prefix).filter(|rest| !rest.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_token_recognizes_keywords_case_insensitively() {
        assert_eq!(Directive::from_token("STRIKE"), Directive::Strike);
        assert_eq!(Directive::from_token("Solve"), Directive::Solve);
        assert_eq!(
            Directive::from_token("UnsubmittablePenalty"),
            Directive::UnsubmittablePenalty
        );
        assert_eq!(Directive::from_token("parseerror"), Directive::ParseError);
        assert_eq!(Directive::from_token("TryCancel"), Directive::TryCancel);
        assert_eq!(
            Directive::from_token("Multiple Strikes"),
            Directive::MultipleStrikes
        );
        assert_eq!(Directive::from_token("Hold Music"), Directive::AmbientMusic);
        assert_eq!(Directive::from_token("hide camera"), Directive::HideCamera);
        assert_eq!(
            Directive::from_token("Explode"),
            Directive::Detonate(DetonateArgs::default())
        );
    }

    #[test]
    fn test_from_token_keeps_argument_text() {
        assert_eq!(
            Directive::from_token("StrikeMessage pressing 5"),
            Directive::StrikeMessage("pressing 5".to_owned())
        );
        assert_eq!(
            Directive::from_token("sendtochat hello there"),
            Directive::SendToChat("hello there".to_owned())
        );
        assert_eq!(
            Directive::from_token("sendtochaterror bad input"),
            Directive::SendToChatError("bad input".to_owned())
        );
    }

    #[test]
    fn test_from_token_passes_through_blank_arguments() {
        assert_eq!(
            Directive::from_token("sendtochat    "),
            Directive::value("sendtochat    ")
        );
        assert_eq!(
            Directive::from_token("strikemessage "),
            Directive::value("strikemessage ")
        );
    }

    #[test]
    fn test_from_token_prefix_forms() {
        assert_eq!(Directive::from_token("add strike now"), Directive::AddStrike);
        assert_eq!(
            Directive::from_token("autosolve: stuck"),
            Directive::AutoSolve("autosolve: stuck".to_owned())
        );
    }

    #[test]
    fn test_from_token_unknown_text_is_pass_through() {
        assert_eq!(
            Directive::from_token("press alarm"),
            Directive::Suspend(Suspend::Value("press alarm".to_owned()))
        );
    }

    #[test]
    fn test_from_tokens_detonate_forms() {
        assert_eq!(
            Directive::from_tokens(&["detonate"]),
            Directive::Detonate(DetonateArgs::default())
        );
        assert_eq!(
            Directive::from_tokens(&["DETONATE", "too slow"]),
            Directive::Detonate(DetonateArgs {
                message: Some("too slow".to_owned()),
                module_name: None,
            })
        );
        assert_eq!(
            Directive::from_tokens(&["explode", "boom", "The Clock"]),
            Directive::Detonate(DetonateArgs {
                message: Some("boom".to_owned()),
                module_name: Some("The Clock".to_owned()),
            })
        );
    }

    #[test]
    fn test_from_tokens_other_lists_pass_through() {
        assert_eq!(
            Directive::from_tokens(&["press", "1"]),
            Directive::value("press 1")
        );
    }

    #[test]
    fn test_euler_quarter_turn_about_x() {
        let rotation = Rotation::from_euler_degrees(90.0, 0.0, 0.0);
        let half = std::f32::consts::FRAC_1_SQRT_2;
        assert!((rotation.x - half).abs() < 1e-6);
        assert!((rotation.w - half).abs() < 1e-6);
        assert!(rotation.y.abs() < 1e-6);
        assert!(rotation.z.abs() < 1e-6);
    }

    #[test]
    fn test_zero_euler_is_identity() {
        assert!(Rotation::from_euler_degrees(0.0, 0.0, 0.0).is_identity());
        assert!(Rotation::default().is_identity());
    }
}
