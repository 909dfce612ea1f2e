//! run command - Combined input feed, capture and redirection

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::command_from;
use crate::engine::{Context, RunOptions, Runner};

/// Arguments of the run command.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub input: Option<PathBuf>,
    pub stdout: bool,
    pub stderr: bool,
    pub output: Option<PathBuf>,
    pub null_stdin: bool,
    pub null_stdout: bool,
    pub null_stderr: bool,
}

impl RunArgs {
    fn options(&self) -> Result<RunOptions> {
        let mut options = RunOptions {
            input: None,
            capture_stdout: self.stdout,
            capture_stderr: self.stderr,
            output_file: self.output.clone(),
            null_stdin: self.null_stdin,
            null_stdout: self.null_stdout,
            null_stderr: self.null_stderr,
        };
        if let Some(path) = &self.input {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            options.input = Some(bytes);
        }
        Ok(options)
    }
}

/// Run `argv` with the requested wiring. Captured streams are written back
/// to our own stdout and stderr once the command has exited.
pub fn run(ctx: &Context, args: &RunArgs, argv: &[String]) -> Result<i32> {
    let command = command_from(argv)?;
    let out = Runner::new(*ctx).run(&command, args.options()?)?;

    if let Some(bytes) = &out.stdout {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()?;
    }
    if let Some(bytes) = &out.stderr {
        std::io::stderr().write_all(bytes)?;
    }

    Ok(out.status)
}
