//! Command: classify the manifest and show what `install` would run.
use anyhow::Result;
use std::fmt::Write as _;

use super::{CommandSetup, warn_unrecognized};
use crate::cli::{CheckOpts, GlobalOpts};
use crate::dispatch;
use crate::logging::Logger;
use crate::manifest::Groups;
use crate::platform::Platform;

/// Run the check command.
///
/// # Errors
///
/// Returns an error if the settings or manifest cannot be loaded, or if the
/// fallback policy rejects an unrecognized line.
pub fn run(global: &GlobalOpts, opts: &CheckOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, opts.manifest.as_deref(), log)?;

    let fallback = opts.fallback.unwrap_or(setup.settings.dispatch.fallback);
    warn_unrecognized(&setup.manifest, fallback, log);
    let groups = setup.manifest.group(fallback)?;

    for line in listing(&groups, &setup.platform).lines() {
        log.info(line);
    }
    log.info(&format!(
        "{} entries from {}",
        groups.len(),
        setup.manifest_path.display()
    ));
    Ok(())
}

/// Render the non-empty groups with the command each entry maps to.
#[must_use]
pub fn listing(groups: &Groups, platform: &Platform) -> String {
    let mut out = String::new();
    let mut current = None;
    for (entry, invocation) in dispatch::plan(groups, platform) {
        if current != Some(entry.directive) {
            let count = groups.get(entry.directive).len();
            let _ = writeln!(out, "{} ({count})", entry.directive);
            current = Some(entry.directive);
        }
        match invocation {
            Ok(inv) => {
                let _ = writeln!(out, "  {:<24} {inv}", entry.argument);
            }
            Err(err) => {
                let _ = writeln!(out, "  {:<24} error: {err}", entry.argument);
            }
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manifest::{FallbackPolicy, Manifest};
    use crate::platform::Os;
    use std::path::PathBuf;

    #[test]
    fn listing_groups_in_dispatch_order() {
        let groups = Manifest::parse("cask \"vlc\"\nbrew \"git\"\nbrew \"jq\"\n")
            .group(FallbackPolicy::Brew)
            .unwrap();
        let platform = Platform::new(Os::Linux, false, Some(PathBuf::from("/home/me")));
        let out = listing(&groups, &platform);
        let headers: Vec<&str> = out.lines().filter(|l| !l.starts_with(' ')).collect();
        assert_eq!(headers, ["brew (2)", "cask (1)"]);
        assert!(out.contains("brew install --cask vlc"));
    }

    #[test]
    fn listing_empty_groups() {
        let platform = Platform::new(Os::Linux, false, None);
        assert_eq!(listing(&Groups::default(), &platform), "");
    }

    #[test]
    fn listing_shows_build_errors() {
        let groups = Manifest::parse("stow \"zsh\"\n")
            .group(FallbackPolicy::Brew)
            .unwrap();
        let platform = Platform::new(Os::Linux, false, None);
        assert!(listing(&groups, &platform).contains("error: invalid stow argument"));
    }
}
