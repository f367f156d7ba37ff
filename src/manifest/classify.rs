//! Line cleaning and directive classification.
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::Directive;

/// `<keyword> "<argument>"` or `<keyword> '<argument>'`, anchored at both ends.
#[allow(clippy::expect_used)]
static DIRECTIVE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?P<keyword>[A-Za-z][A-Za-z0-9_-]*)\s+(?:"(?P<dq>[^"]+)"|'(?P<sq>[^']+)')$"#)
        .expect("directive pattern is a valid literal")
});

/// A recognized directive with its quoted argument.
///
/// `Display` writes the entry back as a manifest line, choosing single quotes
/// when the argument contains a double quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Directive the line belongs to.
    pub directive: Directive,
    /// Quoted content, verbatim.
    pub argument: String,
}

impl Entry {
    /// Create an entry.
    #[must_use]
    pub fn new(directive: Directive, argument: impl Into<String>) -> Self {
        Self {
            directive,
            argument: argument.into(),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.argument.contains('"') {
            write!(f, "{} '{}'", self.directive, self.argument)
        } else {
            write!(f, "{} \"{}\"", self.directive, self.argument)
        }
    }
}

/// Result of testing a cleaned line against every directive grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The line satisfies a directive grammar.
    Recognized(Entry),
    /// The line matches no grammar; the caller decides the fallback.
    Unrecognized(String),
}

/// Remove a trailing comment and surrounding whitespace.
///
/// Everything from the first unescaped `#` is dropped. A backslash escapes
/// the character after it, so `\#` is kept as written while `\\#` starts a
/// comment. Escapes are not unfolded, which makes the operation idempotent.
#[must_use]
pub fn strip_comment(line: &str) -> &str {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if c == '#' && !escaped {
            return line.split_at(i).0.trim();
        }
        escaped = c == '\\' && !escaped;
    }
    line.trim()
}

/// Classify a cleaned line.
///
/// Directive grammars are tested in [`Directive::CLASSIFICATION_ORDER`] and
/// the first match wins. Lines with several arguments, mixed quoting or an
/// empty argument match nothing.
#[must_use]
pub fn classify(line: &str) -> Classification {
    let unrecognized = || Classification::Unrecognized(line.to_string());

    let Some(caps) = DIRECTIVE_LINE.captures(line) else {
        return unrecognized();
    };
    let Some(keyword) = caps.name("keyword") else {
        return unrecognized();
    };
    let Some(argument) = caps.name("dq").or_else(|| caps.name("sq")) else {
        return unrecognized();
    };

    Directive::CLASSIFICATION_ORDER
        .into_iter()
        .find(|d| d.keyword() == keyword.as_str())
        .map_or_else(unrecognized, |directive| {
            Classification::Recognized(Entry::new(directive, argument.as_str()))
        })
}
