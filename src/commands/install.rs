use anyhow::Result;

use super::{CommandSetup, warn_unrecognized};
use crate::cli::{GlobalOpts, InstallOpts};
use crate::dispatch::{self, DispatchOpts, Dispatcher, FailurePolicy};
use crate::exec::{Executor, SystemExecutor};
use crate::logging::Logger;
use crate::settings::DispatchSettings;

/// Run the install command.
///
/// # Errors
///
/// Returns an error if the settings or manifest cannot be loaded, or if any
/// invocation failed.
pub fn run(global: &GlobalOpts, opts: &InstallOpts, log: &Logger) -> Result<()> {
    run_with_executor(global, opts, log, &SystemExecutor)
}

/// Run the install command against a caller-supplied executor.
///
/// # Errors
///
/// Returns an error if the settings or manifest cannot be loaded, if the
/// fallback policy rejects a line, or if any invocation failed.
pub fn run_with_executor(
    global: &GlobalOpts,
    opts: &InstallOpts,
    log: &Logger,
    executor: &dyn Executor,
) -> Result<()> {
    log.info(&format!("mash {}", super::version::version()));
    let setup = CommandSetup::init(global, opts.manifest.as_deref(), log)?;

    let fallback = opts.fallback.unwrap_or(setup.settings.dispatch.fallback);
    warn_unrecognized(&setup.manifest, fallback, log);
    let groups = setup.manifest.group(fallback)?;

    if groups.is_empty() {
        log.info("nothing to install");
        return Ok(());
    }

    let dispatch_opts = dispatch_opts(global, opts, &setup.settings.dispatch);
    let report = Dispatcher::new(executor, &setup.platform, log, dispatch_opts).run(&groups);

    log.print_summary();

    let count = report.failures().count();
    if count > 0 {
        anyhow::bail!("{count} invocation(s) failed");
    }
    Ok(())
}

/// Merge command-line flags, settings and environment; any of them can
/// enable a behaviour.
fn dispatch_opts(global: &GlobalOpts, opts: &InstallOpts, settings: &DispatchSettings) -> DispatchOpts {
    DispatchOpts {
        dry_run: global.dry_run,
        failure: if opts.fail_fast || settings.fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::Continue
        },
        allow_shell: opts.allow_shell || settings.allow_shell || dispatch::env_allows_shell(),
    }
}
