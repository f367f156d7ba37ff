//! Summary entry and status types.

/// Outcome of one dispatched entry, kept for the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    /// Human-readable label, e.g. `cask "vlc"`.
    pub name: String,
    /// Final status.
    pub status: Status,
    /// Optional detail (skip reason or error description).
    pub message: Option<String>,
}

/// Status of a dispatched entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The command exited successfully.
    Ok,
    /// The entry was not run (shell disabled, directory missing, ...).
    Skipped,
    /// Dry-run mode; nothing was executed.
    DryRun,
    /// The command failed, was refused, or its program was missing.
    Failed,
}

/// Console verbosity selected on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Warnings and errors only.
    Quiet,
    /// Informational output.
    #[default]
    Normal,
    /// Informational output plus debug detail.
    Verbose,
}
