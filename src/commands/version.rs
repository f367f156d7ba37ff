//! Command: print version information.

/// Version stamped by the build script, or the crate version for local builds.
#[must_use]
pub fn version() -> &'static str {
    option_env!("MASH_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the mash version to stdout.
pub fn run() {
    println!("mash {}", version());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
