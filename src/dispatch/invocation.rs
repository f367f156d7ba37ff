//! Mapping from a manifest entry to the external command that installs it.
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::RegexSet;

use crate::error::DispatchError;
use crate::manifest::{Directive, Entry};
use crate::platform::Platform;

/// Commands that are never launched, whatever the manifest says.
#[allow(clippy::expect_used)]
static DANGEROUS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([r"\brm\s+-rf\b", r"\bmkfs\b", r"\bshutdown\b"])
        .expect("dangerous command patterns are valid")
});

/// One external command built from a manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    entry: Entry,
    program: String,
    args: Vec<String>,
    required_dir: Option<PathBuf>,
}

impl Invocation {
    /// Build the command for `entry`.
    ///
    /// | directive | command |
    /// |-----------|---------|
    /// | `brew`  | `brew install <arg>` |
    /// | `cask`  | `brew install --cask <arg>` |
    /// | `cargo` | `cargo install <arg>` |
    /// | `uv`    | `uv tool install <arg>` |
    /// | `stow`  | `stow -d <parent> -t <home> -R <name>` |
    /// | `shell` | `/bin/sh -c <arg>` |
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidArgument`] when a `stow` argument has
    /// no final path component or the home directory is unknown.
    pub fn build(entry: &Entry, platform: &Platform) -> Result<Self, DispatchError> {
        let arg = entry.argument.clone();
        let (program, args, required_dir) = match entry.directive {
            Directive::Brew => ("brew", vec!["install".into(), arg], None),
            Directive::Cask => ("brew", vec!["install".into(), "--cask".into(), arg], None),
            Directive::Cargo => ("cargo", vec!["install".into(), arg], None),
            Directive::Uv => ("uv", vec!["tool".into(), "install".into(), arg], None),
            Directive::Shell => ("/bin/sh", vec!["-c".into(), arg], None),
            Directive::Stow => {
                let (args, dir) = stow_args(entry, platform)?;
                ("stow", args, Some(dir))
            }
        };
        Ok(Self {
            entry: entry.clone(),
            program: program.to_string(),
            args,
            required_dir,
        })
    }

    /// The manifest entry this command installs.
    #[must_use]
    pub const fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Program name (or absolute path for `shell`).
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Directory that must exist for the command to make sense (`stow` only).
    #[must_use]
    pub fn required_dir(&self) -> Option<&Path> {
        self.required_dir.as_deref()
    }

    /// Whether any argv element matches a dangerous command pattern.
    #[must_use]
    pub fn is_dangerous(&self) -> bool {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .any(|part| DANGEROUS.is_match(part))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/// Build `-d <parent> -t <home> -R <name>` for a stow package directory.
///
/// Relative arguments are taken relative to the home directory.
fn stow_args(entry: &Entry, platform: &Platform) -> Result<(Vec<String>, PathBuf), DispatchError> {
    let invalid = |reason: &str| DispatchError::InvalidArgument {
        directive: entry.directive,
        argument: entry.argument.clone(),
        reason: reason.to_string(),
    };

    let home = platform
        .home
        .as_ref()
        .ok_or_else(|| invalid("home directory is unknown"))?;

    let expanded = PathBuf::from(
        shellexpand::tilde_with_context(&entry.argument, || home.to_str()).into_owned(),
    );
    let dir = if expanded.is_absolute() {
        expanded
    } else {
        home.join(expanded)
    };

    let name = dir
        .file_name()
        .ok_or_else(|| invalid("path has no package name"))?
        .to_string_lossy()
        .into_owned();
    let parent = dir
        .parent()
        .ok_or_else(|| invalid("path has no parent directory"))?;

    let args = vec![
        "-d".to_string(),
        parent.display().to_string(),
        "-t".to_string(),
        home.display().to_string(),
        "-R".to_string(),
        name,
    ];
    Ok((args, dir))
}

/// Quote `s` for display as a POSIX shell word.
fn quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@+,%".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::platform::Os;

    fn platform() -> Platform {
        Platform::new(Os::Linux, false, Some(PathBuf::from("/home/me")))
    }

    fn build(directive: Directive, arg: &str) -> Invocation {
        Invocation::build(&Entry::new(directive, arg), &platform()).unwrap()
    }

    #[test]
    fn package_manager_commands() {
        assert_eq!(build(Directive::Brew, "git-lfs").to_string(), "brew install git-lfs");
        assert_eq!(build(Directive::Cask, "vlc").to_string(), "brew install --cask vlc");
        assert_eq!(build(Directive::Cargo, "ripgrep").to_string(), "cargo install ripgrep");
        assert_eq!(build(Directive::Uv, "radian").to_string(), "uv tool install radian");
    }

    #[test]
    fn shell_command_is_quoted() {
        let inv = build(Directive::Shell, "echo 'hi' && make");
        assert_eq!(inv.program(), "/bin/sh");
        assert_eq!(inv.args(), ["-c", "echo 'hi' && make"]);
        assert_eq!(inv.to_string(), r"/bin/sh -c 'echo '\''hi'\'' && make'");
    }

    #[test]
    fn stow_relative_to_home() {
        let inv = build(Directive::Stow, "dotfiles/zsh");
        assert_eq!(inv.program(), "stow");
        assert_eq!(
            inv.args(),
            ["-d", "/home/me/dotfiles", "-t", "/home/me", "-R", "zsh"]
        );
        assert_eq!(inv.required_dir(), Some(Path::new("/home/me/dotfiles/zsh")));
    }

    #[test]
    fn stow_expands_tilde_to_platform_home() {
        let inv = build(Directive::Stow, "~/dotfiles/zsh");
        assert_eq!(
            inv.args(),
            ["-d", "/home/me/dotfiles", "-t", "/home/me", "-R", "zsh"]
        );
    }

    #[test]
    fn stow_absolute_path() {
        let inv = build(Directive::Stow, "/srv/dots/nvim");
        assert_eq!(inv.args(), ["-d", "/srv/dots", "-t", "/home/me", "-R", "nvim"]);
    }

    #[test]
    fn stow_without_home_is_invalid() {
        let p = Platform::new(Os::Linux, false, None);
        let err = Invocation::build(&Entry::new(Directive::Stow, "zsh"), &p).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidArgument { .. }), "got {err:?}");
    }

    #[test]
    fn stow_root_is_invalid() {
        let err = Invocation::build(&Entry::new(Directive::Stow, "/"), &platform()).unwrap_err();
        assert!(err.to_string().contains("no package name"), "got {err}");
    }

    #[test]
    fn non_stow_has_no_required_dir() {
        assert!(build(Directive::Brew, "git").required_dir().is_none());
    }

    #[test]
    fn dangerous_patterns_are_detected() {
        assert!(build(Directive::Shell, "rm -rf /").is_dangerous());
        assert!(build(Directive::Shell, "sudo shutdown -h now").is_dangerous());
        assert!(build(Directive::Shell, "mkfs.ext4 /dev/sda1").is_dangerous());
        assert!(!build(Directive::Shell, "rm -r build").is_dangerous());
        assert!(!build(Directive::Brew, "shutdownd").is_dangerous());
    }

    #[test]
    fn quote_plain_and_empty() {
        assert_eq!(quote("abc-1.2"), "abc-1.2");
        assert_eq!(quote(""), "''");
        assert_eq!(quote("a b"), "'a b'");
    }
}
