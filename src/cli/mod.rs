//! CLI surface
//!
//! Subcommands: `init` (write a default config and create directories),
//! `serve` (boot and serve HTTP), `migrate` (offline legacy batch), and
//! `verify-migration` (post-migration verification pass).

pub mod args;
pub mod commands;
pub mod errors;

pub use errors::{CliError, CliResult};

/// Parse arguments and dispatch
pub fn run() -> CliResult<()> {
    commands::run(args::Cli::parse_args())
}
