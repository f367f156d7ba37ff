//! Domain-specific error types for mash.
//!
//! Internal modules return typed errors ([`ManifestError`], [`DispatchError`],
//! [`SettingsError`]) while command handlers at the CLI boundary convert them
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error kinds
//!
//! ```text
//! ManifestError: locating, reading and grouping the manifest
//! DispatchError: one failed package-manager invocation
//! SettingsError: reading or parsing config.toml
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::manifest::Directive;

/// Errors that arise while loading and grouping a manifest.
///
/// `NotFound` and `Io` are fatal and abort before anything is dispatched.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest path does not exist.
    #[error("manifest not found: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The manifest exists but could not be read.
    #[error("IO error reading manifest {}: {source}", path.display())]
    Io {
        /// Path to the manifest.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A line matched no directive grammar and the fallback policy rejects it.
    #[error("unrecognized directive at line {line}: {text}")]
    Unrecognized {
        /// 1-based line number in the manifest.
        line: usize,
        /// Comment-stripped line text.
        text: String,
    },
}

/// Errors describing why a single invocation did not succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The external command ran and exited non-zero (or could not be spawned).
    #[error("{directive} \"{argument}\" failed (exit {code}): {stderr}")]
    InvocationFailure {
        /// Directive group the argument belongs to.
        directive: Directive,
        /// Argument that was passed to the command.
        argument: String,
        /// Exit code, `-1` when terminated by a signal or never spawned.
        code: i32,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The package manager executable could not be located.
    #[error("{program} not found on PATH")]
    ProgramNotFound {
        /// Program name that was looked up.
        program: String,
    },

    /// The command matched a dangerous pattern and was not launched.
    #[error("refusing to run dangerous command: {command}")]
    Refused {
        /// The rendered command line.
        command: String,
    },

    /// The argument cannot be turned into a command for its directive.
    #[error("invalid {directive} argument \"{argument}\": {reason}")]
    InvalidArgument {
        /// Directive group the argument belongs to.
        directive: Directive,
        /// Offending argument.
        argument: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Errors that arise from loading the settings file.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("IO error reading settings {}: {source}", path.display())]
    Io {
        /// Path to the settings file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for the expected schema.
    #[error("invalid settings in {}: {source}", path.display())]
    Parse {
        /// Path to the settings file.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn manifest_not_found_display() {
        let e = ManifestError::NotFound {
            path: PathBuf::from("/tmp/Brewfile"),
        };
        assert_eq!(e.to_string(), "manifest not found: /tmp/Brewfile");
    }

    #[test]
    fn manifest_io_has_source() {
        use std::error::Error as StdError;
        let e = ManifestError::Io {
            path: PathBuf::from("/tmp/Brewfile"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("/tmp/Brewfile"));
    }

    #[test]
    fn manifest_unrecognized_display() {
        let e = ManifestError::Unrecognized {
            line: 4,
            text: "cask vlc".to_string(),
        };
        assert_eq!(e.to_string(), "unrecognized directive at line 4: cask vlc");
    }

    #[test]
    fn invocation_failure_display() {
        let e = DispatchError::InvocationFailure {
            directive: Directive::Cask,
            argument: "vlc".to_string(),
            code: 1,
            stderr: "Error: No available cask".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "cask \"vlc\" failed (exit 1): Error: No available cask"
        );
    }

    #[test]
    fn program_not_found_display() {
        let e = DispatchError::ProgramNotFound {
            program: "stow".to_string(),
        };
        assert_eq!(e.to_string(), "stow not found on PATH");
    }

    #[test]
    fn settings_parse_error_display() {
        let source = toml::from_str::<toml::Table>("= nope").expect_err("invalid toml");
        let e = SettingsError::Parse {
            path: PathBuf::from("config.toml"),
            source,
        };
        assert!(e.to_string().starts_with("invalid settings in config.toml"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<ManifestError>();
        assert_send_sync::<DispatchError>();
        assert_send_sync::<SettingsError>();
    }

    #[test]
    fn errors_convert_to_anyhow() {
        let _m: anyhow::Error = ManifestError::NotFound {
            path: PathBuf::from("x"),
        }
        .into();
        let _d: anyhow::Error = DispatchError::ProgramNotFound {
            program: "uv".to_string(),
        }
        .into();
        let _s: anyhow::Error = SettingsError::Io {
            path: PathBuf::from("config.toml"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        }
        .into();
    }
}
