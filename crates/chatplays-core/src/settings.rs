//! Play settings loaded from YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables for scoring and time mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaySettings {
    /// Fraction of the module score taken for an unsubmittable answer;
    /// zero or less disables the penalty.
    pub unsubmittable_penalty_percent: f32,
    /// Scale strike penalties by the number of strikes in one award.
    pub enable_reward_multiple_strikes: bool,
    /// Upper bound of the time-mode multiplier.
    pub time_mode_max_multiplier: f32,
    /// Lower bound of the time-mode multiplier.
    pub time_mode_min_multiplier: f32,
    /// Time-mode multiplier at the start of a bomb.
    pub time_mode_starting_multiplier: f32,
    /// Added to the multiplier on each solve.
    pub time_mode_solve_bonus: f32,
    /// Taken from the multiplier on each strike.
    pub time_mode_multiplier_strike_penalty: f32,
    /// Seconds lost per strike on a low timer.
    pub time_mode_minimum_time_lost: f32,
    /// Fraction of the timer lost per strike on a high timer.
    pub time_mode_timer_strike_penalty: f32,
    /// Score used for modules that declare none.
    pub default_module_score: i32,
    /// Strike penalty used for modules that declare none.
    pub default_strike_penalty: i32,
    /// Lets commands that only disrupt the stream reach their modules.
    pub enable_troll_commands: bool,
}

impl Default for PlaySettings {
    fn default() -> Self {
        Self {
            unsubmittable_penalty_percent: 0.3,
            enable_reward_multiple_strikes: true,
            time_mode_max_multiplier: 10.0,
            time_mode_min_multiplier: 1.0,
            time_mode_starting_multiplier: 9.0,
            time_mode_solve_bonus: 0.1,
            time_mode_multiplier_strike_penalty: 1.5,
            time_mode_minimum_time_lost: 15.0,
            time_mode_timer_strike_penalty: 0.25,
            default_module_score: 5,
            default_strike_penalty: -6,
            enable_troll_commands: false,
        }
    }
}

impl PlaySettings {
    /// Parses settings from YAML; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] on malformed input and
    /// [`ConfigError::Invalid`] on out-of-range values.
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_yaml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`PlaySettings::from_yaml`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml(&source)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_mode_min_multiplier > self.time_mode_max_multiplier {
            return Err(ConfigError::Invalid(format!(
                "time_mode_min_multiplier {} exceeds time_mode_max_multiplier {}",
                self.time_mode_min_multiplier, self.time_mode_max_multiplier
            )));
        }
        if self.time_mode_timer_strike_penalty <= 0.0 || self.time_mode_timer_strike_penalty > 1.0 {
            return Err(ConfigError::Invalid(format!(
                "time_mode_timer_strike_penalty must be in (0, 1], got {}",
                self.time_mode_timer_strike_penalty
            )));
        }
        if self.time_mode_minimum_time_lost < 0.0 {
            return Err(ConfigError::Invalid(
                "time_mode_minimum_time_lost must not be negative".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Game modes active for the current bomb.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameModes {
    /// Solves add time and strikes remove it.
    pub time_mode: bool,
    /// The timer counts up.
    pub zen_mode: bool,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings = PlaySettings::from_yaml("unsubmittable_penalty_percent: 0.5\n").unwrap();
        assert!((settings.unsubmittable_penalty_percent - 0.5).abs() < f32::EPSILON);
        assert_eq!(settings.default_strike_penalty, -6);
        assert!(settings.enable_reward_multiple_strikes);
    }

    #[test]
    fn test_inverted_multiplier_bounds_are_rejected() {
        let result = PlaySettings::from_yaml(
            "time_mode_min_multiplier: 5.0\ntime_mode_max_multiplier: 2.0\n",
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_timer_penalty_is_rejected() {
        let result = PlaySettings::from_yaml("time_mode_timer_strike_penalty: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_yaml_is_reported() {
        let result = PlaySettings::from_yaml("default_module_score: [oops");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_module_score: 7").unwrap();

        let settings = PlaySettings::load(file.path()).unwrap();
        assert_eq!(settings.default_module_score, 7);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = PlaySettings::load("/definitely/not/here.yaml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
