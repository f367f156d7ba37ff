//! User settings loaded from `config.toml`.
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::SettingsError;
use crate::manifest::FallbackPolicy;

/// Settings read from `$XDG_CONFIG_HOME/mash/config.toml`.
///
/// Every field is optional; command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Manifest path used when neither the command line nor the environment
    /// names one.
    pub manifest: Option<PathBuf>,
    /// Defaults for the `install` command.
    pub dispatch: DispatchSettings,
}

/// The `[dispatch]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchSettings {
    /// Stop at the first failed invocation.
    pub fail_fast: bool,
    /// Run `shell` directives without `--unsafe`.
    pub allow_shell: bool,
    /// Handling of unrecognized manifest lines.
    pub fallback: FallbackPolicy,
}

impl Settings {
    /// Load settings from `explicit`, or from [`default_path`] when `None`.
    ///
    /// A missing default file yields [`Settings::default`]; an explicitly
    /// named file must exist.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] if the file cannot be read and
    /// [`SettingsError::Parse`] if it is not valid settings TOML.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match default_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|source| SettingsError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content).map_err(|source| SettingsError::Parse { path, source })
    }

    /// Parse settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for malformed input or unknown keys.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Default settings location: `$XDG_CONFIG_HOME/mash/config.toml`, falling
/// back to `~/.config/mash/config.toml` on every platform.
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .map(|dir| dir.join("mash").join("config.toml"))
}
