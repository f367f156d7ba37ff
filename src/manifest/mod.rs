//! Manifest reader: load a mashfile, clean its lines and classify them into
//! directive groups.
//!
//! The format is line oriented:
//!
//! ```text
//! <keyword> "<argument>"   # optional trailing comment
//! ```
//!
//! # Examples
//!
//! ```
//! use mash::manifest::{Directive, FallbackPolicy, Manifest};
//!
//! let manifest = Manifest::parse("cask \"vlc\"  # Media Viewer\nbrew \"git-lfs\"\n");
//! let groups = manifest.group(FallbackPolicy::Brew).unwrap();
//! assert_eq!(groups.get(Directive::Cask), ["vlc"]);
//! assert_eq!(groups.get(Directive::Brew), ["git-lfs"]);
//! ```
mod classify;
mod directive;
mod groups;

pub use classify::{Classification, Entry, classify, strip_comment};
pub use directive::Directive;
pub use groups::{FallbackPolicy, Groups};

use std::path::{Path, PathBuf};

use crate::error::ManifestError;

/// Environment variables consulted, in order, when no manifest path is given.
pub const PATH_ENV_VARS: [&str; 2] = ["BREWFILE_PATH", "MASHFILE_PATH"];

/// Manifest file name used when nothing else points at one.
pub const DEFAULT_FILE_NAME: &str = "Brewfile";

/// One cleaned, classified manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLine {
    /// 1-based line number in the source file.
    pub number: usize,
    /// Line text after comment stripping.
    pub text: String,
    /// Which directive grammar, if any, the line satisfies.
    pub classification: Classification,
}

/// An ordered sequence of classified lines; comments and blanks are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    lines: Vec<ManifestLine>,
}

impl Manifest {
    /// Read and classify the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::NotFound`] if `path` does not exist and
    /// [`ManifestError::Io`] if it cannot be read as UTF-8 text.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    /// Classify manifest text.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let lines = content
            .lines()
            .enumerate()
            .filter_map(|(idx, raw)| {
                let text = strip_comment(raw);
                if text.is_empty() {
                    return None;
                }
                Some(ManifestLine {
                    number: idx + 1,
                    text: text.to_string(),
                    classification: classify(text),
                })
            })
            .collect();
        Self { lines }
    }

    /// All retained lines in source order.
    #[must_use]
    pub fn lines(&self) -> &[ManifestLine] {
        &self.lines
    }

    /// Lines that satisfied no directive grammar.
    pub fn unrecognized(&self) -> impl Iterator<Item = &ManifestLine> {
        self.lines
            .iter()
            .filter(|l| matches!(l.classification, Classification::Unrecognized(_)))
    }

    /// Group arguments by directive, applying `fallback` to unrecognized lines.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Unrecognized`] for the first unrecognized
    /// line when `fallback` is [`FallbackPolicy::Reject`].
    pub fn group(&self, fallback: FallbackPolicy) -> Result<Groups, ManifestError> {
        let mut groups = Groups::default();
        for line in &self.lines {
            match (&line.classification, fallback) {
                (Classification::Recognized(entry), _) => {
                    groups.push(entry.directive, entry.argument.as_str());
                }
                (Classification::Unrecognized(raw), FallbackPolicy::Brew) => {
                    groups.push(Directive::residual(), raw.as_str());
                }
                (Classification::Unrecognized(_), FallbackPolicy::Skip) => {}
                (Classification::Unrecognized(raw), FallbackPolicy::Reject) => {
                    return Err(ManifestError::Unrecognized {
                        line: line.number,
                        text: raw.clone(),
                    });
                }
            }
        }
        Ok(groups)
    }
}

/// Decide which manifest file to read.
///
/// Precedence: `explicit`, then `$BREWFILE_PATH`, then `$MASHFILE_PATH`, then
/// `configured` (from the settings file), then `./Brewfile`. A leading `~` is
/// expanded to the home directory. The result is not checked for existence;
/// [`Manifest::load`] reports a missing file.
#[must_use]
pub fn resolve_path(explicit: Option<&Path>, configured: Option<&Path>) -> PathBuf {
    let env_path = || {
        PATH_ENV_VARS
            .iter()
            .find_map(|var| std::env::var_os(var).filter(|v| !v.is_empty()))
            .map(PathBuf::from)
    };

    let chosen = explicit
        .map(Path::to_path_buf)
        .or_else(env_path)
        .or_else(|| configured.map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_NAME));

    expand_tilde(&chosen)
}

/// Expand a leading `~` using the current user's home directory.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    path.to_str().map_or_else(
        || path.to_path_buf(),
        |s| PathBuf::from(shellexpand::tilde(s).into_owned()),
    )
}
