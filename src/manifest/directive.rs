use std::fmt;
use std::str::FromStr;

/// A manifest line's category, determining which package manager handles it.
///
/// Variants are declared in dispatch order, so the derived `Ord` sorts
/// directives the way the dispatcher runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Directive {
    /// Arbitrary command run through `/bin/sh -c`.
    Shell,
    /// Homebrew formula; also the residual group for unrecognized lines.
    Brew,
    /// Homebrew cask.
    Cask,
    /// Crate installed with `cargo install`.
    Cargo,
    /// Python tool installed with `uv tool install`.
    Uv,
    /// Dotfile package directory linked with GNU stow.
    Stow,
}

impl Directive {
    /// Order in which directive groups are dispatched.
    pub const DISPATCH_ORDER: [Self; 6] = [
        Self::Shell,
        Self::Brew,
        Self::Cask,
        Self::Cargo,
        Self::Uv,
        Self::Stow,
    ];

    /// Order in which directive grammars are tried when classifying a line.
    ///
    /// `Brew` comes last: a line satisfying a specific grammar never lands in
    /// the residual group.
    pub const CLASSIFICATION_ORDER: [Self; 6] = [
        Self::Cask,
        Self::Uv,
        Self::Cargo,
        Self::Stow,
        Self::Shell,
        Self::Brew,
    ];

    /// The keyword that starts a line of this directive.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Shell => "shell",
            Self::Brew => "brew",
            Self::Cask => "cask",
            Self::Cargo => "cargo",
            Self::Uv => "uv",
            Self::Stow => "stow",
        }
    }

    /// The fallback group for lines matching no directive grammar.
    #[must_use]
    pub const fn residual() -> Self {
        Self::Brew
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Directive {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::DISPATCH_ORDER
            .into_iter()
            .find(|d| d.keyword() == s)
            .ok_or_else(|| format!("unknown directive '{s}'"))
    }
}
