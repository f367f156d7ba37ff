pub mod check;
pub mod install;
pub mod version;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::logging::Logger;
use crate::manifest::{self, Classification, FallbackPolicy, Manifest};
use crate::platform::Platform;
use crate::settings::Settings;

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates platform detection, settings loading, and manifest reading
/// so that each command does not have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    pub platform: Platform,
    pub settings: Settings,
    /// Manifest location, canonicalized when it exists.
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
}

impl CommandSetup {
    /// Detect the platform, load settings, and read the manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file is malformed or the manifest
    /// cannot be found or read.
    pub fn init(global: &GlobalOpts, manifest: Option<&Path>, log: &Logger) -> Result<Self> {
        let platform = Platform::detect();
        log.debug(&format!(
            "platform: {} ({})",
            platform.os,
            if platform.is_arm { "arm" } else { "x86" }
        ));

        let settings = Settings::load(global.config.as_deref())?;

        let manifest_path = manifest::resolve_path(manifest, settings.manifest.as_deref());
        log.stage(&format!("Reading {}", manifest_path.display()));
        let manifest = Manifest::load(&manifest_path)
            .with_context(|| format!("loading manifest {}", manifest_path.display()))?;
        let manifest_path = dunce::canonicalize(&manifest_path).unwrap_or(manifest_path);

        let unrecognized = manifest.unrecognized().count();
        log.debug(&format!(
            "{} lines, {unrecognized} unrecognized",
            manifest.lines().len()
        ));

        Ok(Self {
            platform,
            settings,
            manifest_path,
            manifest,
        })
    }
}

/// Warn about every unrecognized manifest line according to `fallback`.
///
/// Under [`FallbackPolicy::Reject`] nothing is logged here; grouping fails
/// with the first offending line instead.
pub fn warn_unrecognized(manifest: &Manifest, fallback: FallbackPolicy, log: &Logger) {
    for line in manifest.unrecognized() {
        let Classification::Unrecognized(raw) = &line.classification else {
            continue;
        };
        match fallback {
            FallbackPolicy::Brew => log.warn(&format!(
                "line {}: unrecognized directive, treating as brew formula: {raw}",
                line.number
            )),
            FallbackPolicy::Skip => log.warn(&format!(
                "line {}: skipping unrecognized directive: {raw}",
                line.number
            )),
            FallbackPolicy::Reject => {}
        }
    }
}
