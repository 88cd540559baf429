//! Environment configuration for the console host.

use std::path::PathBuf;

use chatplays_core::settings::{GameModes, PlaySettings};
use tracing::info;

use crate::error::AppError;

/// Default descriptor file, next to the working directory.
pub const DEFAULT_MODULE_DATA: &str = "ModuleInformation.json";

/// Identity used for lines typed without a `nick:` prefix.
pub const DEFAULT_STREAMER: &str = "streamer";

/// Host configuration read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Optional YAML file with play settings.
    pub settings_path: Option<PathBuf>,
    /// JSON file holding the module descriptors.
    pub module_data: PathBuf,
    /// Game modes for the simulated bomb.
    pub modes: GameModes,
    /// Identities granted admin access.
    pub admins: Vec<String>,
    /// Identity of the console operator. Always has streamer access.
    pub streamer: String,
}

impl Config {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidEnv`] when a flag is not a boolean.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidEnv`] when a flag is not a boolean.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let settings_path = lookup("CHATPLAYS_SETTINGS")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        let module_data = lookup("CHATPLAYS_MODULE_DATA")
            .filter(|path| !path.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_MODULE_DATA), PathBuf::from);
        let modes = GameModes {
            time_mode: flag(&lookup, "CHATPLAYS_TIME_MODE")?,
            zen_mode: flag(&lookup, "CHATPLAYS_ZEN_MODE")?,
        };
        let admins = lookup("CHATPLAYS_ADMINS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        let streamer = lookup("CHATPLAYS_STREAMER")
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_STREAMER.to_owned());

        Ok(Self {
            settings_path,
            module_data,
            modes,
            admins,
            streamer,
        })
    }

    /// Loads the play settings, or the defaults when no file is configured.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when the file is unreadable or invalid.
    pub fn load_settings(&self) -> Result<PlaySettings, AppError> {
        let Some(path) = &self.settings_path else {
            return Ok(PlaySettings::default());
        };
        let settings = PlaySettings::load(path)?;
        info!(path = %path.display(), "loaded play settings");
        Ok(settings)
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<bool, AppError> {
    let Some(value) = lookup(name) else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        _ => Err(AppError::InvalidEnv { name, value }),
    }
}
