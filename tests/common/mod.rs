// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed manifest plus settings file and an
// executor that records commands instead of running them, so each integration
// test can drive a command end to end without touching the host.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use mash::cli::GlobalOpts;
use mash::exec::{ExecResult, Executor};
use mash::logging::Logger;

/// Serializes environment manipulation across the tests of one binary.
pub static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Run `f` with `var` set to `value` (or removed), restoring the previous
/// value afterwards.
#[allow(unsafe_code)] // set_var/remove_var require unsafe since Rust 1.83
pub fn with_env<T>(var: &str, value: Option<&OsStr>, f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let saved = std::env::var_os(var);
    unsafe {
        match value {
            Some(v) => std::env::set_var(var, v),
            None => std::env::remove_var(var),
        }
    }
    let result = f();
    unsafe {
        match saved {
            Some(v) => std::env::set_var(var, v),
            None => std::env::remove_var(var),
        }
    }
    result
}

/// An [`Executor`] that records every command and reports success unless the
/// final argument is listed in `failing`.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
    failing: Vec<String>,
    missing: Vec<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make invocations whose last argument is `arg` exit with status 1.
    pub fn failing_on(mut self, arg: &str) -> Self {
        self.failing.push(arg.to_string());
        self
    }

    /// Make `program` unresolvable.
    pub fn without_program(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    /// Every recorded call as `program arg arg ...`, program by file name.
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(program, args)| {
                let name = program
                    .file_name()
                    .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
                std::iter::once(name)
                    .chain(args.iter().cloned())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

impl Executor for RecordingExecutor {
    fn run_unchecked(&self, program: &Path, args: &[String]) -> anyhow::Result<ExecResult> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((program.to_path_buf(), args.to_vec()));
        let fails = args.last().is_some_and(|a| self.failing.contains(a));
        Ok(ExecResult {
            stdout: String::new(),
            stderr: if fails { "Error: simulated failure\n".to_string() } else { String::new() },
            success: !fails,
            code: Some(i32::from(fails)),
        })
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        if self.missing.iter().any(|m| m == program) {
            return None;
        }
        Some(PathBuf::from("/test/bin").join(program))
    }
}

/// A manifest and an empty settings file in an isolated temp directory.
pub struct TestManifest {
    pub dir: tempfile::TempDir,
}

impl TestManifest {
    /// Write `content` as the manifest.
    pub fn new(content: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join("Brewfile"), content).expect("write Brewfile");
        std::fs::write(dir.path().join("config.toml"), "").expect("write config.toml");
        Self { dir }
    }

    /// Replace the settings file.
    pub fn with_settings(self, content: &str) -> Self {
        std::fs::write(self.dir.path().join("config.toml"), content).expect("write config.toml");
        self
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.path().join("Brewfile")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    /// A logger whose log file lives under this directory rather than the
    /// user's cache.
    pub fn logger(&self, command: &str) -> Logger {
        let cache = self.dir.path().join("cache");
        with_env("XDG_CACHE_HOME", Some(cache.as_os_str()), || Logger::new(command))
    }

    /// Global options pointing at this directory's settings file.
    pub fn global(&self, dry_run: bool) -> GlobalOpts {
        GlobalOpts {
            dry_run,
            config: Some(self.settings_path()),
        }
    }
}

/// Path to a file under `tests/fixtures/`.
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
