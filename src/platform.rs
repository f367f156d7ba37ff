use std::fmt;
use std::path::PathBuf;

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// macOS.
    MacOs,
    /// Linux (Linuxbrew setups).
    Linux,
    /// Anything else; only `PATH` lookups are attempted.
    Other,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => write!(f, "macos"),
            Self::Linux => write!(f, "linux"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Platform information for the current system.
///
/// Environment-derived locations are captured once by [`Platform::detect`]
/// so that program resolution does not read the environment again.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Operating system.
    pub os: Os,
    /// Whether the CPU is ARM (Apple silicon puts Homebrew under `/opt/homebrew`).
    pub is_arm: bool,
    /// Home directory, used for `~` expansion and stow targets.
    pub home: Option<PathBuf>,
    /// `$HOMEBREW_PREFIX`, if set.
    pub homebrew_prefix: Option<PathBuf>,
    /// `$CARGO_HOME`, if set.
    pub cargo_home: Option<PathBuf>,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub fn detect() -> Self {
        let os = if cfg!(target_os = "macos") {
            Os::MacOs
        } else if cfg!(target_os = "linux") {
            Os::Linux
        } else {
            Os::Other
        };
        Self {
            os,
            is_arm: cfg!(target_arch = "aarch64"),
            home: dirs::home_dir(),
            homebrew_prefix: std::env::var_os("HOMEBREW_PREFIX").map(PathBuf::from),
            cargo_home: std::env::var_os("CARGO_HOME").map(PathBuf::from),
        }
    }

    /// Create a platform with explicit values and no environment overrides.
    #[must_use]
    pub const fn new(os: Os, is_arm: bool, home: Option<PathBuf>) -> Self {
        Self {
            os,
            is_arm,
            home,
            homebrew_prefix: None,
            cargo_home: None,
        }
    }

    /// Homebrew installation prefix.
    ///
    /// `$HOMEBREW_PREFIX` wins; otherwise the installer defaults:
    /// `/opt/homebrew` on Apple silicon, `/usr/local` on Intel macOS and
    /// `~/.linuxbrew` on Linux.
    #[must_use]
    pub fn homebrew_prefix(&self) -> Option<PathBuf> {
        if let Some(prefix) = &self.homebrew_prefix {
            return Some(prefix.clone());
        }
        match self.os {
            Os::MacOs if self.is_arm => Some(PathBuf::from("/opt/homebrew")),
            Os::MacOs => Some(PathBuf::from("/usr/local")),
            Os::Linux => self.home.as_ref().map(|h| h.join(".linuxbrew")),
            Os::Other => None,
        }
    }

    /// Locations to try for `program` when it is not on `PATH`.
    ///
    /// Installers for brew, rustup and uv often leave their binaries off
    /// `PATH` until the next login shell.
    #[must_use]
    pub fn fallback_locations(&self, program: &str) -> Vec<PathBuf> {
        let mut bin_dirs = Vec::new();
        if program == "cargo" {
            if let Some(cargo_home) = &self.cargo_home {
                bin_dirs.push(cargo_home.join("bin"));
            }
            if let Some(home) = &self.home {
                bin_dirs.push(home.join(".cargo").join("bin"));
            }
        }
        if program == "uv"
            && let Some(home) = &self.home
        {
            bin_dirs.push(home.join(".local").join("bin"));
        }
        if let Some(prefix) = self.homebrew_prefix() {
            bin_dirs.push(prefix.join("bin"));
        }
        bin_dirs.into_iter().map(|d| d.join(program)).collect()
    }
}
