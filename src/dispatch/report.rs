use crate::error::DispatchError;
use crate::logging::Status;
use crate::manifest::Entry;

/// What happened to one manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command ran and exited zero.
    Ok,
    /// Dry run; the command was logged, not launched.
    DryRun,
    /// Not attempted for the given reason.
    Skipped(String),
    /// Not installed.
    Failed(DispatchError),
}

impl Outcome {
    /// Whether this outcome is a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Summary status for the logger.
    #[must_use]
    pub const fn status(&self) -> Status {
        match self {
            Self::Ok => Status::Ok,
            Self::DryRun => Status::DryRun,
            Self::Skipped(_) => Status::Skipped,
            Self::Failed(_) => Status::Failed,
        }
    }

    /// Human-readable detail for skips and failures.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Ok | Self::DryRun => None,
            Self::Skipped(reason) => Some(reason.clone()),
            Self::Failed(err) => Some(err.to_string()),
        }
    }
}

/// Outcome of one entry together with the command line it mapped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The manifest entry.
    pub entry: Entry,
    /// Rendered command, `None` if no command could be built.
    pub command: Option<String>,
    /// What happened.
    pub outcome: Outcome,
}

/// Every outcome of a dispatch run, in dispatch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    records: Vec<Record>,
    not_attempted: usize,
}

impl DispatchReport {
    pub(super) fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub(super) const fn set_not_attempted(&mut self, count: usize) {
        self.not_attempted = count;
    }

    /// All records in the order they were dispatched.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Records whose outcome is [`Outcome::Failed`].
    pub fn failures(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.outcome.is_failure())
    }

    /// Whether no entry failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Entries left untouched after a fail-fast stop.
    #[must_use]
    pub const fn not_attempted(&self) -> usize {
        self.not_attempted
    }
}
