//! Brewfile-style manifest installer.
//!
//! Reads a line-oriented manifest of `<keyword> "<argument>"` directives,
//! groups the entries by package manager, and runs one install command per
//! entry.
//!
//! The public API is organised into three layers:
//!
//! - **[`manifest`]**: locate, clean and classify manifest lines into groups
//! - **[`dispatch`]**: map each grouped entry to an external command and run it
//! - **[`commands`]**: top-level subcommand orchestration (`install`, `check`, `version`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod dispatch;
pub mod error;
pub mod exec;
pub mod logging;
pub mod manifest;
pub mod platform;
pub mod settings;
