//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Turns its arguments into an assembled [`crate::core::command::Command`]
//! 2. Hands it to the [`crate::engine::Runner`]
//! 3. Formats the result and returns the exit status for the process
//!
//! Handlers never spawn processes themselves, and never join arguments into
//! a shell string.

mod capture;
mod completion;
mod config_cmd;
mod exec;
mod inject;
mod quote;
mod run_cmd;

pub use capture::capture;
pub use completion::completion;
pub use config_cmd::{path as config_path, set as config_set, show as config_show};
pub use exec::exec;
pub use inject::inject;
pub use quote::{quote, transform_for};
pub use run_cmd::{run, RunArgs};

use anyhow::{bail, Result};

use crate::cli::args::{Command, ConfigAction};
use crate::core::command::{ArgSpec, Command as Argv};
use crate::core::config::Config;
use crate::engine::Context;

/// Dispatch a command to its handler and return the process exit status.
pub fn dispatch(command: Command, ctx: &Context, config: &Config) -> Result<i32> {
    match command {
        Command::Exec { argv } => exec(ctx, &argv),
        Command::Capture { json, argv } => capture(ctx, &argv, json),
        Command::Inject { lines, from, argv } => inject(ctx, &lines, from.as_deref(), &argv),
        Command::Run {
            input,
            stdout,
            stderr,
            output,
            null_stdin,
            null_stdout,
            null_stderr,
            argv,
        } => {
            let args = RunArgs {
                input,
                stdout,
                stderr,
                output,
                null_stdin,
                null_stdout,
                null_stderr,
            };
            run(ctx, &args, &argv)
        }
        Command::Quote {
            escape,
            dash_guard,
            program,
            args,
        } => quote(&program, &args, escape, dash_guard),
        Command::Config { action } => match action {
            ConfigAction::Show { json } => config_show(config, json),
            ConfigAction::Set { key, value } => config_set(ctx, config, &key, &value),
            ConfigAction::Path => config_path(config),
        },
        Command::Completion { shell } => completion(shell),
    }
}

/// Assemble a command from a raw argument vector, verbatim.
pub(crate) fn command_from(argv: &[String]) -> Result<Argv> {
    let Some((program, args)) = argv.split_first() else {
        bail!("No command given");
    };
    Ok(Argv::assemble(
        program.as_str(),
        &[ArgSpec::seq(args.iter().cloned())],
    ))
}
