use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;
use crate::manifest::FallbackPolicy;

/// Top-level CLI entry point for the manifest installer.
#[derive(Parser, Debug)]
#[command(
    name = "mash",
    about = "Install packages listed in a Brewfile-style manifest",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

impl Cli {
    /// Console verbosity selected by `-v` / `-q`.
    #[must_use]
    pub const fn verbosity(&self) -> Verbosity {
        if self.verbose {
            Verbosity::Verbose
        } else if self.quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Preview commands without running them
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Settings file (default: $XDG_CONFIG_HOME/mash/config.toml, else ~/.config/mash/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install everything listed in the manifest
    Install(InstallOpts),
    /// Classify the manifest and list what would be installed
    Check(CheckOpts),
    /// Print version information
    Version,
}

/// Options for the `install` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InstallOpts {
    /// Manifest to read (default: $BREWFILE_PATH, $MASHFILE_PATH or ./Brewfile)
    pub manifest: Option<PathBuf>,

    /// Allow `shell` directives to run
    #[arg(short = 'u', long = "unsafe")]
    pub allow_shell: bool,

    /// Stop at the first failed invocation
    #[arg(long)]
    pub fail_fast: bool,

    /// How to treat lines that match no directive
    #[arg(long, value_enum)]
    pub fallback: Option<FallbackPolicy>,
}

/// Options for the `check` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CheckOpts {
    /// Manifest to read (default: $BREWFILE_PATH, $MASHFILE_PATH or ./Brewfile)
    pub manifest: Option<PathBuf>,

    /// How to treat lines that match no directive
    #[arg(long, value_enum)]
    pub fallback: Option<FallbackPolicy>,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_install_defaults() {
        let cli = Cli::parse_from(["mash", "install"]);
        assert!(
            matches!(&cli.command, Command::Install(_)),
            "Expected Install command"
        );
        if let Command::Install(opts) = cli.command {
            assert!(opts.manifest.is_none());
            assert!(!opts.allow_shell);
            assert!(!opts.fail_fast);
            assert!(opts.fallback.is_none());
        }
    }

    #[test]
    fn parse_install_with_manifest_and_flags() {
        let cli = Cli::parse_from([
            "mash",
            "install",
            "/tmp/Brewfile",
            "--unsafe",
            "--fail-fast",
            "--fallback",
            "reject",
        ]);
        if let Command::Install(opts) = cli.command {
            assert_eq!(opts.manifest, Some(PathBuf::from("/tmp/Brewfile")));
            assert!(opts.allow_shell);
            assert!(opts.fail_fast);
            assert_eq!(opts.fallback, Some(FallbackPolicy::Reject));
        } else {
            panic!("Expected Install command");
        }
    }

    #[test]
    fn parse_unsafe_short() {
        let cli = Cli::parse_from(["mash", "install", "-u"]);
        assert!(matches!(cli.command, Command::Install(InstallOpts { allow_shell: true, .. })));
    }

    #[test]
    fn parse_dry_run_short_and_global() {
        let cli = Cli::parse_from(["mash", "install", "-n"]);
        assert!(cli.global.dry_run);
        let cli = Cli::parse_from(["mash", "--dry-run", "install"]);
        assert!(cli.global.dry_run);
    }

    #[test]
    fn parse_config_override() {
        let cli = Cli::parse_from(["mash", "--config", "/tmp/mash.toml", "check"]);
        assert_eq!(cli.global.config, Some(PathBuf::from("/tmp/mash.toml")));
    }

    #[test]
    fn parse_check_with_fallback() {
        let cli = Cli::parse_from(["mash", "check", "--fallback", "skip"]);
        if let Command::Check(opts) = cli.command {
            assert_eq!(opts.fallback, Some(FallbackPolicy::Skip));
        } else {
            panic!("Expected Check command");
        }
    }

    #[test]
    fn parse_invalid_fallback_fails() {
        assert!(Cli::try_parse_from(["mash", "check", "--fallback", "apt"]).is_err());
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["mash", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn verbosity_flags() {
        assert_eq!(
            Cli::parse_from(["mash", "-v", "install"]).verbosity(),
            Verbosity::Verbose
        );
        assert_eq!(
            Cli::parse_from(["mash", "-q", "install"]).verbosity(),
            Verbosity::Quiet
        );
        assert_eq!(
            Cli::parse_from(["mash", "install"]).verbosity(),
            Verbosity::Normal
        );
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["mash", "-v", "-q", "install"]).is_err());
    }
}
