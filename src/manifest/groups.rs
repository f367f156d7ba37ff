use std::collections::BTreeMap;

use serde::Deserialize;

use super::{Directive, Entry};

/// What to do with lines that match no directive grammar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Route the raw line, verbatim, into the `brew` group.
    #[default]
    Brew,
    /// Drop the line; callers report it as a warning.
    Skip,
    /// Fail grouping at the first unrecognized line.
    Reject,
}

/// Arguments grouped by directive.
///
/// Every directive has a key, possibly with an empty list. Iteration follows
/// [`Directive::DISPATCH_ORDER`]; arguments keep their source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Groups {
    by_directive: BTreeMap<Directive, Vec<String>>,
}

impl Default for Groups {
    fn default() -> Self {
        Self {
            by_directive: Directive::DISPATCH_ORDER
                .into_iter()
                .map(|d| (d, Vec::new()))
                .collect(),
        }
    }
}

impl Groups {
    /// Append an argument to a directive's group.
    pub fn push(&mut self, directive: Directive, argument: impl Into<String>) {
        self.by_directive
            .entry(directive)
            .or_default()
            .push(argument.into());
    }

    /// Arguments for one directive, in source order.
    #[must_use]
    pub fn get(&self, directive: Directive) -> &[String] {
        self.by_directive.get(&directive).map_or(&[], Vec::as_slice)
    }

    /// Iterate `(directive, arguments)` pairs in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = (Directive, &[String])> {
        self.by_directive.iter().map(|(d, args)| (*d, args.as_slice()))
    }

    /// Total number of arguments across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_directive.values().map(Vec::len).sum()
    }

    /// Whether every group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize the groups back into manifest text, one entry per line.
    ///
    /// Parsing the output yields the same group assignment, except for an
    /// argument containing both `"` and `'`: no quoting can hold it, so the
    /// written line reads back as unrecognized. Only raw lines kept by
    /// [`FallbackPolicy::Brew`] can carry such an argument.
    #[must_use]
    pub fn to_manifest(&self) -> String {
        let mut out = String::new();
        for (directive, args) in self.iter() {
            for arg in args {
                out.push_str(&Entry::new(directive, arg.as_str()).to_string());
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_has_every_directive() {
        let groups = Groups::default();
        let keys: Vec<Directive> = groups.iter().map(|(d, _)| d).collect();
        assert_eq!(keys, Directive::DISPATCH_ORDER);
        assert!(groups.is_empty());
    }

    #[test]
    fn push_preserves_order_and_duplicates() {
        let mut groups = Groups::default();
        groups.push(Directive::Cargo, "bat");
        groups.push(Directive::Cargo, "fd-find");
        groups.push(Directive::Cargo, "bat");
        assert_eq!(groups.get(Directive::Cargo), ["bat", "fd-find", "bat"]);
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn to_manifest_writes_dispatch_order() {
        let mut groups = Groups::default();
        groups.push(Directive::Stow, "zsh");
        groups.push(Directive::Brew, "git");
        assert_eq!(groups.to_manifest(), "brew \"git\"\nstow \"zsh\"\n");
    }

    #[test]
    fn to_manifest_quotes_around_double_quotes() {
        let mut groups = Groups::default();
        groups.push(Directive::Brew, "mas \"Xcode\", id: 497799835");
        assert_eq!(groups.to_manifest(), "brew 'mas \"Xcode\", id: 497799835'\n");
    }

    #[test]
    fn fallback_policy_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            fallback: FallbackPolicy,
        }
        let w: Wrapper = toml::from_str("fallback = \"reject\"").unwrap();
        assert_eq!(w.fallback, FallbackPolicy::Reject);
    }
}
