//! completion command - Print a shell completion script for ovc

use std::io::Write;

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{generate, Shell as CompletionShell};

use crate::cli::args::{Cli, Shell};

impl From<Shell> for CompletionShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => CompletionShell::Bash,
            Shell::Zsh => CompletionShell::Zsh,
            Shell::Fish => CompletionShell::Fish,
            Shell::PowerShell => CompletionShell::PowerShell,
        }
    }
}

/// Print the completion script for `shell` on stdout.
pub fn completion(shell: Shell) -> Result<i32> {
    let mut out = std::io::stdout().lock();
    write_script(shell, &mut out);
    out.flush()?;
    Ok(0)
}

/// Write the completion script for `shell`, named after the binary.
pub fn write_script(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    generate(CompletionShell::from(shell), &mut cmd, bin, out);
}
