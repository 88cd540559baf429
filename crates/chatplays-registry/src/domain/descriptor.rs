//! Module descriptors and their default shadows.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Corner of the module face that holds the status light.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLight {
    pub left: bool,
    pub bottom: bool,
}

impl StatusLight {
    /// Derives the corner from the light's local position on the face.
    #[must_use]
    pub fn from_local_position(x: f32, z: f32) -> Self {
        Self {
            left: x < 0.0,
            bottom: z < 0.0,
        }
    }
}

impl fmt::Display for StatusLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vertical = if self.bottom { "bottom" } else { "top" };
        let horizontal = if self.left { "left" } else { "right" };
        write!(f, "{vertical} {horizontal}")
    }
}

/// Metadata describing how a module type is scored and treated.
///
/// Each `*_override` flag freezes its field: once set, merges keep the
/// stored value until [`reset_to_default`] discards the descriptor.
///
/// [`reset_to_default`]: crate::ModuleRegistry::reset_to_default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleDescriptor {
    pub module_id: String,
    pub display_name: Option<String>,
    /// Fixed score, or the rule tag when `score_is_dynamic` is set.
    pub score: i32,
    pub score_is_dynamic: bool,
    /// Signed score delta per strike.
    pub strike_penalty: i32,
    pub help_text: Option<String>,
    pub manual_code: Option<String>,
    pub status_light: StatusLight,
    /// Case-insensitive patterns a command must match; `None` allows all.
    pub valid_commands: Option<Vec<String>>,
    /// The handler always produces a value before it touches the module.
    pub does_the_right_thing: bool,
    pub camera_pinning_always_allowed: bool,
    /// The module exposes a cancellation flag.
    pub cancellable: bool,
    pub built_in: bool,
    pub unclaimed_color: Option<String>,

    pub help_text_override: bool,
    pub manual_code_override: bool,
    pub score_override: bool,
    pub strike_penalty_override: bool,
    pub status_light_override: bool,
    pub valid_commands_override: bool,
}

impl Default for ModuleDescriptor {
    fn default() -> Self {
        Self {
            module_id: String::new(),
            display_name: None,
            score: 5,
            score_is_dynamic: false,
            strike_penalty: -6,
            help_text: None,
            manual_code: None,
            status_light: StatusLight::default(),
            valid_commands: None,
            does_the_right_thing: false,
            camera_pinning_always_allowed: false,
            cancellable: false,
            built_in: false,
            unclaimed_color: None,
            help_text_override: false,
            manual_code_override: false,
            score_override: false,
            strike_penalty_override: false,
            status_light_override: false,
            valid_commands_override: false,
        }
    }
}

impl ModuleDescriptor {
    /// Creates an all-default descriptor for `module_id`.
    #[must_use]
    pub fn new(module_id: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            ..Self::default()
        }
    }

    /// Display name, falling back to the module id.
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.module_id)
    }

    /// Whether any override flag is set.
    #[must_use]
    pub fn has_overrides(&self) -> bool {
        self.help_text_override
            || self.manual_code_override
            || self.score_override
            || self.strike_penalty_override
            || self.status_light_override
            || self.valid_commands_override
    }

    /// Merges `incoming` into `self` field by field.
    ///
    /// A field whose override flag is already set keeps its value. Incoming
    /// override flags are OR-ed in. For modules not built in, the command
    /// allow-list follows `incoming` and the capability flags accumulate.
    ///
    /// Returns whether any field changed.
    pub fn merge_from(&mut self, incoming: &ModuleDescriptor) -> bool {
        let before = self.clone();

        if let Some(name) = incoming.display_name.as_deref().filter(|n| !n.is_empty()) {
            self.display_name = Some(name.to_owned());
        }
        if !self.help_text_override
            && (is_present(incoming.help_text.as_deref()) || incoming.help_text_override)
        {
            self.help_text.clone_from(&incoming.help_text);
        }
        if !self.manual_code_override
            && (is_present(incoming.manual_code.as_deref()) || incoming.manual_code_override)
        {
            self.manual_code.clone_from(&incoming.manual_code);
        }
        if !self.status_light_override {
            self.status_light = incoming.status_light;
        }
        if !self.score_override {
            self.score = incoming.score;
            self.score_is_dynamic = incoming.score_is_dynamic;
        }
        if !self.strike_penalty_override {
            self.strike_penalty = incoming.strike_penalty;
        }
        if !self.built_in {
            if !self.valid_commands_override {
                self.valid_commands.clone_from(&incoming.valid_commands);
            }
            self.does_the_right_thing |= incoming.does_the_right_thing;
            self.cancellable |= incoming.cancellable;
        }
        self.camera_pinning_always_allowed |= incoming.camera_pinning_always_allowed;
        self.unclaimed_color.clone_from(&incoming.unclaimed_color);

        self.help_text_override |= incoming.help_text_override;
        self.manual_code_override |= incoming.manual_code_override;
        self.score_override |= incoming.score_override;
        self.strike_penalty_override |= incoming.strike_penalty_override;
        self.status_light_override |= incoming.status_light_override;
        self.valid_commands_override |= incoming.valid_commands_override;

        *self != before
    }
}

fn is_present(text: Option<&str>) -> bool {
    text.is_some_and(|t| !t.is_empty())
}

/// Descriptor fields compared for drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorField {
    DisplayName,
    Score,
    StrikePenalty,
    HelpText,
    ManualCode,
    StatusLight,
    ValidCommands,
}

impl DescriptorField {
    /// The camelCase key used in persisted descriptors.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::DisplayName => "displayName",
            Self::Score => "score",
            Self::StrikePenalty => "strikePenalty",
            Self::HelpText => "helpText",
            Self::ManualCode => "manualCode",
            Self::StatusLight => "statusLight",
            Self::ValidCommands => "validCommands",
        }
    }
}

/// Factory-declared values of a descriptor, written once.
///
/// Used for drift detection and resets only; it never drives dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultModuleDescriptor(ModuleDescriptor);

impl DefaultModuleDescriptor {
    /// Captures `declared` with every override flag cleared.
    #[must_use]
    pub fn from_declared(declared: &ModuleDescriptor) -> Self {
        Self(ModuleDescriptor {
            help_text_override: false,
            manual_code_override: false,
            score_override: false,
            strike_penalty_override: false,
            status_light_override: false,
            valid_commands_override: false,
            ..declared.clone()
        })
    }

    /// Borrows the declared values.
    #[must_use]
    pub fn as_descriptor(&self) -> &ModuleDescriptor {
        &self.0
    }

    /// Returns an owned copy of the declared values.
    #[must_use]
    pub fn to_descriptor(&self) -> ModuleDescriptor {
        self.0.clone()
    }

    /// Lists the fields where `current` differs from the declared values.
    #[must_use]
    pub fn drift(&self, current: &ModuleDescriptor) -> Vec<DescriptorField> {
        let declared = &self.0;
        let mut fields = Vec::new();
        if declared.display_name != current.display_name {
            fields.push(DescriptorField::DisplayName);
        }
        if declared.score != current.score || declared.score_is_dynamic != current.score_is_dynamic
        {
            fields.push(DescriptorField::Score);
        }
        if declared.strike_penalty != current.strike_penalty {
            fields.push(DescriptorField::StrikePenalty);
        }
        if declared.help_text != current.help_text {
            fields.push(DescriptorField::HelpText);
        }
        if declared.manual_code != current.manual_code {
            fields.push(DescriptorField::ManualCode);
        }
        if declared.status_light != current.status_light {
            fields.push(DescriptorField::StatusLight);
        }
        if declared.valid_commands != current.valid_commands {
            fields.push(DescriptorField::ValidCommands);
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovered() -> ModuleDescriptor {
        ModuleDescriptor {
            display_name: Some("Color Generator".to_owned()),
            score: 5,
            help_text: Some("!{0} submit".to_owned()),
            valid_commands: Some(vec!["^submit$".to_owned()]),
            ..ModuleDescriptor::new("Color Generator")
        }
    }

    #[test]
    fn test_merge_takes_incoming_values_without_overrides() {
        let mut stored = ModuleDescriptor::new("Color Generator");
        let changed = stored.merge_from(&discovered());

        assert!(changed);
        assert_eq!(stored, discovered());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut stored = discovered();
        assert!(!stored.merge_from(&discovered()));
    }

    #[test]
    fn test_overridden_fields_survive_every_merge() {
        let mut stored = ModuleDescriptor {
            score: 12,
            score_override: true,
            help_text: Some("custom".to_owned()),
            help_text_override: true,
            strike_penalty: -2,
            strike_penalty_override: true,
            valid_commands: None,
            valid_commands_override: true,
            ..discovered()
        };

        let mut incoming = discovered();
        incoming.score = 1;
        incoming.score_override = true;
        incoming.help_text = Some("other".to_owned());
        incoming.strike_penalty = -20;
        incoming.valid_commands = Some(vec!["x".to_owned()]);

        for _ in 0..3 {
            stored.merge_from(&incoming);
            assert_eq!(stored.score, 12);
            assert_eq!(stored.help_text.as_deref(), Some("custom"));
            assert_eq!(stored.strike_penalty, -2);
            assert_eq!(stored.valid_commands, None);
        }
    }

    #[test]
    fn test_incoming_override_flags_accumulate() {
        let mut stored = discovered();
        let incoming = ModuleDescriptor {
            manual_code: Some("Color%20Generator".to_owned()),
            manual_code_override: true,
            ..discovered()
        };

        stored.merge_from(&incoming);
        assert!(stored.manual_code_override);
        assert_eq!(stored.manual_code.as_deref(), Some("Color%20Generator"));

        stored.merge_from(&discovered());
        assert!(stored.manual_code_override);
        assert_eq!(stored.manual_code.as_deref(), Some("Color%20Generator"));
    }

    #[test]
    fn test_capability_flags_accumulate_for_external_modules() {
        let mut stored = discovered();
        stored.merge_from(&ModuleDescriptor {
            does_the_right_thing: true,
            cancellable: true,
            ..discovered()
        });
        stored.merge_from(&discovered());

        assert!(stored.does_the_right_thing);
        assert!(stored.cancellable);
    }

    #[test]
    fn test_built_in_modules_keep_their_allow_list() {
        let mut stored = ModuleDescriptor {
            built_in: true,
            valid_commands: None,
            ..ModuleDescriptor::new("WireSetComponentSolver")
        };
        stored.merge_from(&ModuleDescriptor {
            valid_commands: Some(vec!["cut".to_owned()]),
            does_the_right_thing: true,
            ..ModuleDescriptor::new("WireSetComponentSolver")
        });

        assert_eq!(stored.valid_commands, None);
        assert!(!stored.does_the_right_thing);
    }

    #[test]
    fn test_blank_help_text_does_not_erase_stored_text() {
        let mut stored = discovered();
        stored.merge_from(&ModuleDescriptor {
            help_text: Some(String::new()),
            ..discovered()
        });
        assert_eq!(stored.help_text.as_deref(), Some("!{0} submit"));
    }

    #[test]
    fn test_default_shadow_drops_override_flags_and_reports_drift() {
        let declared = ModuleDescriptor {
            score_override: true,
            ..discovered()
        };
        let shadow = DefaultModuleDescriptor::from_declared(&declared);
        assert!(!shadow.as_descriptor().has_overrides());

        let mut current = discovered();
        current.score = 9;
        current.status_light = StatusLight {
            left: true,
            bottom: false,
        };
        assert_eq!(
            shadow.drift(&current),
            vec![DescriptorField::Score, DescriptorField::StatusLight]
        );
        assert!(shadow.drift(&discovered()).is_empty());
    }

    #[test]
    fn test_status_light_from_position() {
        let light = StatusLight::from_local_position(-0.07, -0.07);
        assert!(light.left && light.bottom);
        assert_eq!(light.to_string(), "bottom left");
        assert_eq!(
            StatusLight::from_local_position(0.07, 0.07).to_string(),
            "top right"
        );
    }

    #[test]
    fn test_descriptor_json_uses_camel_case_and_defaults() {
        let json = serde_json::json!({ "moduleId": "SeaShells", "score": 7 });
        let descriptor: ModuleDescriptor = serde_json::from_value(json).unwrap();

        assert_eq!(descriptor.module_id, "SeaShells");
        assert_eq!(descriptor.score, 7);
        assert_eq!(descriptor.strike_penalty, -6);

        let back = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(back["strikePenalty"], -6);
        assert_eq!(back["scoreIsDynamic"], false);
    }
}
