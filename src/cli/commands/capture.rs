//! capture command - Run a command and print its captured output lines

use anyhow::Result;
use serde::Serialize;

use super::command_from;
use crate::engine::{Context, Runner};

#[derive(Serialize)]
struct CaptureReport<'a> {
    program: &'a str,
    status: i32,
    lines: &'a [String],
}

/// Run `argv` capturing stdout, then print the lines.
///
/// Returns the command's exit status.
pub fn capture(ctx: &Context, argv: &[String], json: bool) -> Result<i32> {
    let command = command_from(argv)?;
    let (status, lines) = Runner::new(*ctx).capture(&command)?;

    if json {
        let report = CaptureReport {
            program: command.program(),
            status,
            lines: &lines,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in &lines {
            println!("{}", line);
        }
    }

    Ok(status)
}
