//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--verbose` / `-v`: Echo each command before running it
//! - `--dry-run` / `-n`: Echo commands without running anything
//! - `--debug`: Debug logging; repeat to also echo I/O bytes
//! - `--quiet` / `-q`: Minimal output
//! - `--pager <CMD>` / `--paging <WHEN>` / `--no-pager`: Pager control

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::core::config::{Config, Paging};
use crate::core::escape::Backend;
use crate::engine::Context;

/// ovc - A uniform front-end over native version-control tools
#[derive(Parser, Debug)]
#[command(name = "ovc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Echo each command before running it
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Echo commands without running anything
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Enable debug logging (repeat to also echo fed and captured bytes)
    #[arg(long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Pager command line, run through /bin/sh
    #[arg(long, global = true, value_name = "CMD")]
    pub pager: Option<String>,

    /// When to page output
    #[arg(long, global = true, value_enum, value_name = "WHEN")]
    pub paging: Option<Paging>,

    /// Never page output
    #[arg(long, global = true, conflicts_with_all = ["pager", "paging"])]
    pub no_pager: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Build the engine context. Flags add to what the config enables.
    pub fn context(&self, config: &Config) -> Context {
        Context {
            verbose: self.verbose || config.verbose(),
            dry_run: self.dry_run,
            debug: self.debug.max(config.debug()),
            quiet: self.quiet,
        }
    }

    /// The pager command: `--no-pager`, then `--pager`, then config and
    /// environment.
    pub fn pager_command(&self, config: &Config) -> Option<String> {
        if self.no_pager {
            None
        } else {
            self.pager
                .clone()
                .or_else(|| config.pager_command().map(str::to_string))
        }
    }

    /// When to page: `--no-pager`, then `--paging`, then config.
    pub fn paging(&self, config: &Config) -> Paging {
        if self.no_pager {
            Paging::Never
        } else {
            self.paging.unwrap_or_else(|| config.paging())
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command with inherited stdio and exit with its status
    #[command(after_help = "\
EXAMPLES:
    ovc exec -- git status
    ovc --dry-run exec -- p4 submit -d 'fix build'")]
    Exec {
        /// Program and arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        argv: Vec<String>,
    },

    /// Run a command capturing its output, then print the output lines
    Capture {
        /// Print status and lines as JSON
        #[arg(long)]
        json: bool,

        /// Program and arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        argv: Vec<String>,
    },

    /// Run a command feeding it lines on stdin
    #[command(after_help = "\
EXAMPLES:
    ovc inject --line 'Change: new' --line 'Description: fix' -- p4 change -i
    ovc inject --from change.txt -- p4 change -i")]
    Inject {
        /// A line to feed (repeatable)
        #[arg(long = "line", value_name = "LINE")]
        lines: Vec<String>,

        /// Read the lines to feed from a file
        #[arg(long = "from", value_name = "FILE", conflicts_with = "lines")]
        from: Option<PathBuf>,

        /// Program and arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        argv: Vec<String>,
    },

    /// Run a command with any combination of input feed, capture and
    /// redirection
    Run {
        /// Feed this file's bytes to stdin
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Capture stdout and re-emit it after the command exits
        #[arg(long)]
        stdout: bool,

        /// Capture stderr and re-emit it after the command exits
        #[arg(long)]
        stderr: bool,

        /// Write stdout to this file (created or truncated)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Connect stdin to /dev/null
        #[arg(long)]
        null_stdin: bool,

        /// Connect stdout to /dev/null
        #[arg(long)]
        null_stdout: bool,

        /// Connect stderr to /dev/null
        #[arg(long)]
        null_stderr: bool,

        /// Program and arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        argv: Vec<String>,
    },

    /// Assemble a command and print its display line without running it
    Quote {
        /// Escape arguments for this backend (perforce, subversion)
        #[arg(long, value_parser = parse_backend, value_name = "BACKEND")]
        escape: Option<Backend>,

        /// Prefix ./ to a first argument that starts with '-'
        #[arg(long)]
        dash_guard: bool,

        /// Program
        program: String,

        /// Arguments, treated as one list
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Command {
    /// Whether this command's output goes through the pager.
    pub fn is_pageable(&self) -> bool {
        matches!(
            self,
            Command::Exec { .. } | Command::Capture { .. } | Command::Run { .. }
        )
    }
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show the resolved configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a value in the config file
    Set {
        /// Configuration key (verbose, debug, pager.command, pager.paging)
        key: String,
        /// Value to set
        value: String,
    },
    /// Print the path of the config file in use
    Path,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

fn parse_backend(name: &str) -> Result<Backend, String> {
    Backend::from_name(name).ok_or_else(|| {
        format!(
            "unknown backend '{}', expected one of: perforce, subversion",
            name
        )
    })
}
