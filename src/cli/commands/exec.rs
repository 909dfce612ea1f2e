//! exec command - Run a command with inherited stdio

use anyhow::Result;

use super::command_from;
use crate::engine::{Context, Runner};

/// Run `argv` and return its exit status.
pub fn exec(ctx: &Context, argv: &[String]) -> Result<i32> {
    let command = command_from(argv)?;
    Ok(Runner::new(*ctx).execute(&command)?)
}
