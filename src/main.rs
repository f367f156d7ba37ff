use anyhow::Result;
use clap::Parser;

use mash::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();

    let command_name = match &args.command {
        cli::Command::Install(_) => "install",
        cli::Command::Check(_) => "check",
        cli::Command::Version => {
            commands::version::run();
            return Ok(());
        }
    };

    logging::init_subscriber(args.verbosity(), command_name);
    let log = logging::Logger::new(command_name);

    match &args.command {
        cli::Command::Install(opts) => commands::install::run(&args.global, opts, &log),
        cli::Command::Check(opts) => commands::check::run(&args.global, opts, &log),
        cli::Command::Version => Ok(()),
    }
}
