//! cli
//!
//! Command-line interface layer for ovc.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Merge them with the loaded configuration into an engine [`Context`]
//! - Put pageable commands under the pager supervisor
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! handlers in [`commands`], which assemble commands and run them through the
//! [`crate::engine`].

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::core::config::Config;
use crate::engine::{self, Context};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Run the CLI application and return the process exit status.
///
/// This is the main entry point called from `main.rs`. Pageable commands
/// may never return here: under a pager the process exits from inside the
/// supervisor.
pub fn run() -> Result<i32> {
    let cli = Cli::parse_args();
    let config = Config::load().context("Failed to load configuration")?;

    let ctx: Context = cli.context(&config);
    let pager = cli.pager_command(&config);
    let paging = cli.paging(&config);

    if cli.command.is_pageable() {
        let command = cli.command;
        engine::with_pager(&ctx, pager.as_deref(), paging, || {
            report(commands::dispatch(command, &ctx, &config))
        });
    }

    commands::dispatch(cli.command, &ctx, &config)
}

/// Turn a handler result into an exit status, printing any error.
fn report(result: Result<i32>) -> i32 {
    match result {
        Ok(status) => status,
        Err(e) => {
            output::error(format!("{:#}", e));
            1
        }
    }
}
