//! inject command - Run a command feeding it lines on stdin

use std::path::Path;

use anyhow::{Context as _, Result};

use super::command_from;
use crate::engine::{Context, Runner};
use crate::ui::output;

/// Feed `lines` (or the lines of `from`) to `argv` and return its status.
pub fn inject(ctx: &Context, lines: &[String], from: Option<&Path>, argv: &[String]) -> Result<i32> {
    let command = command_from(argv)?;
    let lines = match from {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
            .lines()
            .map(str::to_string)
            .collect(),
        None => lines.to_vec(),
    };
    if lines.iter().any(|line| line.contains('\n')) {
        output::warn(
            "an injected line contains a newline; the command will read it as several lines",
            ctx.verbosity(),
        );
    }
    Ok(Runner::new(*ctx).inject(&lines, &command)?)
}
