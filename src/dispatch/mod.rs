//! Dispatcher: turn grouped manifest entries into package-manager invocations.
//!
//! Groups run in [`Directive::DISPATCH_ORDER`]; within a group, entries run in
//! source order. Every process is awaited before the next one starts.
mod invocation;
mod report;

pub use invocation::Invocation;
pub use report::{DispatchReport, Outcome, Record};

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::DispatchError;
use crate::exec::Executor;
use crate::logging::Logger;
use crate::manifest::{Directive, Entry, Groups};
use crate::platform::Platform;

/// Environment variable that enables `shell` directives when set to `1`.
pub const UNSAFE_ENV_VAR: &str = "MASH_EXEC_UNSAFE";

/// Whether [`UNSAFE_ENV_VAR`] enables `shell` directives.
#[must_use]
pub fn env_allows_shell() -> bool {
    std::env::var(UNSAFE_ENV_VAR).is_ok_and(|v| v == "1")
}

/// Run `f` with [`UNSAFE_ENV_VAR`] set to `value` (or removed), restoring the
/// previous value afterwards.
#[cfg(test)]
#[allow(unsafe_code)]
pub(crate) fn with_unsafe_env<T>(value: Option<&str>, f: impl FnOnce() -> T) -> T {
    let _guard = crate::logging::TEST_ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let saved = std::env::var_os(UNSAFE_ENV_VAR);
    unsafe {
        match value {
            Some(v) => std::env::set_var(UNSAFE_ENV_VAR, v),
            None => std::env::remove_var(UNSAFE_ENV_VAR),
        }
    }
    let result = f();
    unsafe {
        match saved {
            Some(v) => std::env::set_var(UNSAFE_ENV_VAR, v),
            None => std::env::remove_var(UNSAFE_ENV_VAR),
        }
    }
    result
}

/// What to do after an invocation fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure and keep going.
    #[default]
    Continue,
    /// Stop; remaining entries are not attempted.
    FailFast,
}

/// Options controlling a dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOpts {
    /// Log commands instead of running them.
    pub dry_run: bool,
    /// Behaviour after a failure.
    pub failure: FailurePolicy,
    /// Run `shell` directives instead of skipping them.
    pub allow_shell: bool,
}

/// Build the invocation for every grouped entry, in dispatch order, without
/// running anything.
#[must_use]
pub fn plan(groups: &Groups, platform: &Platform) -> Vec<(Entry, Result<Invocation, DispatchError>)> {
    groups
        .iter()
        .flat_map(|(directive, args)| args.iter().map(move |arg| Entry::new(directive, arg.as_str())))
        .map(|entry| {
            let invocation = Invocation::build(&entry, platform);
            (entry, invocation)
        })
        .collect()
}

/// Runs grouped manifest entries through an [`Executor`].
pub struct Dispatcher<'a> {
    executor: &'a dyn Executor,
    platform: &'a Platform,
    log: &'a Logger,
    opts: DispatchOpts,
}

impl std::fmt::Debug for Dispatcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("executor", &"<dyn Executor>")
            .field("platform", &self.platform)
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(
        executor: &'a dyn Executor,
        platform: &'a Platform,
        log: &'a Logger,
        opts: DispatchOpts,
    ) -> Self {
        Self {
            executor,
            platform,
            log,
            opts,
        }
    }

    /// Dispatch every entry in `groups` and report each outcome.
    ///
    /// Outcomes are also recorded on the logger for the closing summary.
    #[must_use]
    pub fn run(&self, groups: &Groups) -> DispatchReport {
        let total = groups.len();
        let mut report = DispatchReport::default();
        let mut resolved: HashMap<String, Option<PathBuf>> = HashMap::new();

        for (directive, args) in groups.iter() {
            if args.is_empty() {
                continue;
            }
            self.log.stage(&format!("{directive} ({})", args.len()));

            for arg in args {
                let entry = Entry::new(directive, arg.as_str());
                let record = self.dispatch_one(entry, &mut resolved);
                self.log_outcome(&record);
                let failed = record.outcome.is_failure();
                report.push(record);

                if failed && self.opts.failure == FailurePolicy::FailFast {
                    let remaining = total - report.records().len();
                    if remaining > 0 {
                        self.log
                            .warn(&format!("fail-fast: {remaining} entries not attempted"));
                    }
                    report.set_not_attempted(remaining);
                    return report;
                }
            }
        }
        report
    }

    fn dispatch_one(
        &self,
        entry: Entry,
        resolved: &mut HashMap<String, Option<PathBuf>>,
    ) -> Record {
        if entry.directive == Directive::Shell && !self.opts.allow_shell {
            return Record {
                entry,
                command: None,
                outcome: Outcome::Skipped(format!(
                    "shell directives disabled (pass --unsafe or set {UNSAFE_ENV_VAR}=1)"
                )),
            };
        }

        let invocation = match Invocation::build(&entry, self.platform) {
            Ok(inv) => inv,
            Err(err) => {
                return Record {
                    entry,
                    command: None,
                    outcome: Outcome::Failed(err),
                };
            }
        };
        let command = invocation.to_string();
        let outcome = self.execute(&invocation, &command, resolved);
        Record {
            entry,
            command: Some(command),
            outcome,
        }
    }

    fn execute(
        &self,
        invocation: &Invocation,
        command: &str,
        resolved: &mut HashMap<String, Option<PathBuf>>,
    ) -> Outcome {
        if let Some(dir) = invocation.required_dir()
            && !dir.is_dir()
        {
            return Outcome::Skipped(format!("directory not found: {}", dir.display()));
        }

        if invocation.is_dangerous() {
            return Outcome::Failed(DispatchError::Refused {
                command: command.to_string(),
            });
        }

        if self.opts.dry_run {
            self.log.dry_run(command);
            return Outcome::DryRun;
        }

        let program = invocation.program();
        let path = resolved
            .entry(program.to_string())
            .or_insert_with(|| self.resolve_program(program))
            .clone();
        let Some(path) = path else {
            return Outcome::Failed(DispatchError::ProgramNotFound {
                program: program.to_string(),
            });
        };

        self.log.debug(&format!("running: {command}"));
        let entry = invocation.entry();
        match self.executor.run_unchecked(&path, invocation.args()) {
            Ok(result) if result.success => {
                if !result.stdout.trim().is_empty() {
                    self.log.debug(result.stdout.trim());
                }
                Outcome::Ok
            }
            Ok(result) => Outcome::Failed(DispatchError::InvocationFailure {
                directive: entry.directive,
                argument: entry.argument.clone(),
                code: result.code.unwrap_or(-1),
                stderr: result.stderr.trim().to_string(),
            }),
            Err(err) => Outcome::Failed(DispatchError::InvocationFailure {
                directive: entry.directive,
                argument: entry.argument.clone(),
                code: -1,
                stderr: format!("{err:#}"),
            }),
        }
    }

    /// Locate `program` on `PATH`, then in the platform's well-known
    /// install locations.
    fn resolve_program(&self, program: &str) -> Option<PathBuf> {
        if let Some(path) = self.executor.which(program) {
            return Some(path);
        }
        let found = self
            .platform
            .fallback_locations(program)
            .into_iter()
            .find(|p| p.is_file());
        if let Some(path) = &found {
            self.log
                .debug(&format!("{program} not on PATH, using {}", path.display()));
        }
        found
    }

    fn log_outcome(&self, record: &Record) {
        let name = record.entry.to_string();
        match &record.outcome {
            Outcome::Ok => self.log.info(&format!("installed {name}")),
            Outcome::DryRun => {}
            Outcome::Skipped(reason) => self.log.info(&format!("skipped {name}: {reason}")),
            Outcome::Failed(err) => self.log.error(&format!("{name}: {err}")),
        }
        self.log
            .record(&name, record.outcome.status(), record.outcome.message().as_deref());
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::exec::{ExecResult, MockExecutor};
    use crate::logging::isolated_logger;
    use crate::manifest::{FallbackPolicy, Manifest};
    use crate::platform::Os;
    use std::path::Path;

    fn platform(home: &Path) -> Platform {
        Platform::new(Os::Other, false, Some(home.to_path_buf()))
    }

    fn ok() -> ExecResult {
        ExecResult {
            stdout: String::new(),
            stderr: String::new(),
            success: true,
            code: Some(0),
        }
    }

    fn failed(code: i32, stderr: &str) -> ExecResult {
        ExecResult {
            stdout: String::new(),
            stderr: stderr.to_string(),
            success: false,
            code: Some(code),
        }
    }

    fn groups(text: &str) -> Groups {
        Manifest::parse(text).group(FallbackPolicy::Brew).unwrap()
    }

    /// Mock that finds every program under `/usr/bin`.
    fn finding_executor() -> MockExecutor {
        let mut mock = MockExecutor::new();
        mock.expect_which()
            .returning(|p| Some(PathBuf::from("/usr/bin").join(p)));
        mock
    }

    #[test]
    fn runs_groups_in_dispatch_order() {
        let (log, tmp, _guard) = isolated_logger();
        let mut mock = finding_executor();
        let mut seq = mockall::Sequence::new();
        for (program, first_arg) in [("brew", "git"), ("brew", "--cask"), ("uv", "tool")] {
            mock.expect_run_unchecked()
                .withf(move |p, args| {
                    p.ends_with(program) && args.iter().any(|a| a == first_arg)
                })
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(ok()));
        }

        let p = platform(tmp.path());
        let dispatcher = Dispatcher::new(&mock, &p, &log, DispatchOpts::default());
        let report = dispatcher.run(&groups("uv \"radian\"\ncask \"vlc\"\nbrew \"git\"\n"));

        assert!(report.is_success());
        let order: Vec<Directive> = report.records().iter().map(|r| r.entry.directive).collect();
        assert_eq!(order, [Directive::Brew, Directive::Cask, Directive::Uv]);
    }

    #[test]
    fn dry_run_launches_nothing() {
        let (log, tmp, _guard) = isolated_logger();
        let mut mock = MockExecutor::new();
        mock.expect_run_unchecked().never();
        mock.expect_which().never();

        let p = platform(tmp.path());
        let opts = DispatchOpts {
            dry_run: true,
            ..DispatchOpts::default()
        };
        let report = Dispatcher::new(&mock, &p, &log, opts)
            .run(&groups("brew \"git\"\ncargo \"ripgrep\"\n"));

        assert!(report.is_success());
        assert!(report.records().iter().all(|r| r.outcome == Outcome::DryRun));
        assert_eq!(
            report.records()[1].command.as_deref(),
            Some("cargo install ripgrep")
        );
    }

    #[test]
    fn failure_continues_by_default() {
        let (log, tmp, _guard) = isolated_logger();
        let mut mock = finding_executor();
        mock.expect_run_unchecked()
            .withf(|_, args| args.last().is_some_and(|a| a == "bad"))
            .returning(|_, _| Ok(failed(1, "Error: No formula\n")));
        mock.expect_run_unchecked()
            .withf(|_, args| args.last().is_some_and(|a| a == "good"))
            .times(1)
            .returning(|_, _| Ok(ok()));

        let p = platform(tmp.path());
        let report = Dispatcher::new(&mock, &p, &log, DispatchOpts::default())
            .run(&groups("brew \"bad\"\nbrew \"good\"\n"));

        assert!(!report.is_success());
        assert_eq!(report.records().len(), 2);
        assert_eq!(report.not_attempted(), 0);
        let failure = report.failures().next().unwrap();
        assert_eq!(
            failure.outcome,
            Outcome::Failed(DispatchError::InvocationFailure {
                directive: Directive::Brew,
                argument: "bad".to_string(),
                code: 1,
                stderr: "Error: No formula".to_string(),
            })
        );
        assert_eq!(log.failure_count(), 1);
    }

    #[test]
    fn fail_fast_stops_after_first_failure() {
        let (log, tmp, _guard) = isolated_logger();
        let mut mock = finding_executor();
        mock.expect_run_unchecked()
            .times(1)
            .returning(|_, _| Ok(failed(2, "boom")));

        let p = platform(tmp.path());
        let opts = DispatchOpts {
            failure: FailurePolicy::FailFast,
            ..DispatchOpts::default()
        };
        let report =
            Dispatcher::new(&mock, &p, &log, opts).run(&groups("brew \"a\"\nbrew \"b\"\ncask \"c\"\n"));

        assert_eq!(report.records().len(), 1);
        assert_eq!(report.not_attempted(), 2);
        assert!(!report.is_success());
    }

    #[test]
    fn shell_skipped_unless_allowed() {
        let (log, tmp, _guard) = isolated_logger();
        let mut mock = MockExecutor::new();
        mock.expect_run_unchecked().never();

        let p = platform(tmp.path());
        let report = Dispatcher::new(&mock, &p, &log, DispatchOpts::default())
            .run(&groups("shell \"make install\"\n"));

        assert!(report.is_success());
        assert!(matches!(report.records()[0].outcome, Outcome::Skipped(_)));
    }

    #[test]
    fn shell_runs_when_allowed() {
        let (log, tmp, _guard) = isolated_logger();
        let mut mock = finding_executor();
        mock.expect_run_unchecked()
            .withf(|_, args| args.iter().map(String::as_str).eq(["-c", "make install"]))
            .times(1)
            .returning(|_, _| Ok(ok()));

        let p = platform(tmp.path());
        let opts = DispatchOpts {
            allow_shell: true,
            ..DispatchOpts::default()
        };
        let report = Dispatcher::new(&mock, &p, &log, opts).run(&groups("shell \"make install\"\n"));
        assert_eq!(report.records()[0].outcome, Outcome::Ok);
    }

    #[test]
    fn dangerous_command_is_refused() {
        let (log, tmp, _guard) = isolated_logger();
        let mut mock = MockExecutor::new();
        mock.expect_run_unchecked().never();

        let p = platform(tmp.path());
        let opts = DispatchOpts {
            allow_shell: true,
            ..DispatchOpts::default()
        };
        let report = Dispatcher::new(&mock, &p, &log, opts).run(&groups("shell \"rm -rf /\"\n"));
        assert!(matches!(
            report.records()[0].outcome,
            Outcome::Failed(DispatchError::Refused { .. })
        ));
    }

    #[test]
    fn missing_program_fails_without_launch() {
        let (log, tmp, _guard) = isolated_logger();
        let mut mock = MockExecutor::new();
        mock.expect_which().times(1).returning(|_| None);
        mock.expect_run_unchecked().never();

        let p = platform(tmp.path());
        let report = Dispatcher::new(&mock, &p, &log, DispatchOpts::default())
            .run(&groups("cargo \"bat\"\ncargo \"fd-find\"\n"));

        assert_eq!(report.failures().count(), 2);
        assert_eq!(
            report.records()[0].outcome,
            Outcome::Failed(DispatchError::ProgramNotFound {
                program: "cargo".to_string()
            })
        );
    }

    #[test]
    fn stow_missing_directory_is_skipped() {
        let (log, tmp, _guard) = isolated_logger();
        let mut mock = MockExecutor::new();
        mock.expect_run_unchecked().never();

        let p = platform(tmp.path());
        let report = Dispatcher::new(&mock, &p, &log, DispatchOpts::default())
            .run(&groups("stow \"dotfiles/zsh\"\n"));
        assert!(matches!(report.records()[0].outcome, Outcome::Skipped(_)));
    }

    #[test]
    fn stow_existing_directory_runs() {
        let (log, tmp, _guard) = isolated_logger();
        std::fs::create_dir_all(tmp.path().join("dotfiles").join("zsh")).unwrap();
        let home = tmp.path().display().to_string();
        let parent = tmp.path().join("dotfiles").display().to_string();

        let mut mock = finding_executor();
        mock.expect_run_unchecked()
            .withf(move |_, args| {
                args.iter().map(String::as_str).eq([
                    "-d",
                    parent.as_str(),
                    "-t",
                    home.as_str(),
                    "-R",
                    "zsh",
                ])
            })
            .times(1)
            .returning(|_, _| Ok(ok()));

        let p = platform(tmp.path());
        let report = Dispatcher::new(&mock, &p, &log, DispatchOpts::default())
            .run(&groups("stow \"dotfiles/zsh\"\n"));
        assert_eq!(report.records()[0].outcome, Outcome::Ok);
    }

    #[test]
    fn spawn_error_is_invocation_failure() {
        let (log, tmp, _guard) = isolated_logger();
        let mut mock = finding_executor();
        mock.expect_run_unchecked()
            .returning(|_, _| Err(anyhow::anyhow!("permission denied")));

        let p = platform(tmp.path());
        let report = Dispatcher::new(&mock, &p, &log, DispatchOpts::default())
            .run(&groups("brew \"git\"\n"));
        match &report.records()[0].outcome {
            Outcome::Failed(DispatchError::InvocationFailure { code, stderr, .. }) => {
                assert_eq!(*code, -1);
                assert!(stderr.contains("permission denied"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn empty_groups_dispatch_nothing() {
        let (log, tmp, _guard) = isolated_logger();
        let mock = MockExecutor::new();
        let p = platform(tmp.path());
        let report = Dispatcher::new(&mock, &p, &log, DispatchOpts::default()).run(&Groups::default());
        assert!(report.records().is_empty());
        assert!(report.is_success());
    }

    #[test]
    fn plan_lists_commands_in_order() {
        let p = Platform::new(Os::Linux, false, Some(PathBuf::from("/home/me")));
        let planned = plan(&groups("cargo \"bat\"\nbrew \"git\"\n"), &p);
        let commands: Vec<String> = planned
            .iter()
            .map(|(_, inv)| inv.as_ref().unwrap().to_string())
            .collect();
        assert_eq!(commands, ["brew install git", "cargo install bat"]);
    }

    #[test]
    fn unsafe_env_var_enables_shell_only_when_one() {
        assert!(with_unsafe_env(Some("1"), env_allows_shell));
        assert!(!with_unsafe_env(Some("0"), env_allows_shell));
        assert!(!with_unsafe_env(Some("yes"), env_allows_shell));
        assert!(!with_unsafe_env(Some(""), env_allows_shell));
        assert!(!with_unsafe_env(None, env_allows_shell));
    }
}
