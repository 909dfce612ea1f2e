//! engine
//!
//! Subprocess execution and I/O orchestration.
//!
//! # Architecture
//!
//! The engine runs an assembled [`crate::core::command::Command`] as a child
//! process. It never goes through a shell.
//!
//! - [`monitor`] - One pipe between the parent and a child's fd 0, 1 or 2
//! - [`runner`] - Spawns the child and drives its monitors to completion
//! - [`status`] - Wait-status interpretation
//! - [`pager`] - Three-process pager supervision
//!
//! # Concurrency
//!
//! No threads. A single `poll(2)` loop services whichever pipe is ready, so a
//! child blocked writing its output can never deadlock against the parent
//! blocked feeding its input. The only other concurrency is between OS
//! processes.
//!
//! # Errors
//!
//! A child that exits is a value (its exit code), whatever the code. A child
//! killed by a signal is an [`ExecError::Signaled`]: callers propagate it to
//! the top level, which aborts the program. There is no model for resuming a
//! VCS operation that was killed halfway.

pub mod monitor;
pub mod pager;
pub mod runner;
pub mod status;

pub use monitor::{Direction, Monitor};
pub use pager::{select_pager, with_pager, Arbiter, Decision, Event, PagerError, PagerSession};
pub use runner::{split_lines, RunOptions, RunOutput, Runner, EXEC_FAILED_STATUS};

use std::path::PathBuf;

use thiserror::Error;

use crate::ui::output::Verbosity;

/// Execution context for the engine.
///
/// Mode flags are passed explicitly rather than read from global state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    /// Echo each command before running it.
    pub verbose: bool,
    /// Log commands but never spawn anything.
    pub dry_run: bool,
    /// Debug level: 1 logs engine decisions, 2 also echoes I/O bytes.
    pub debug: u8,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl Context {
    /// The logging level these flags select.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose, self.debug)
    }

    /// Verbosity used for command echo. Dry-run always echoes.
    pub fn echo_verbosity(&self) -> Verbosity {
        if self.dry_run {
            self.verbosity().max(Verbosity::Verbose)
        } else {
            self.verbosity()
        }
    }
}

/// Errors from running a subprocess.
///
/// Every variant is fatal to the program: callers only propagate these.
#[derive(Debug, Error)]
pub enum ExecError {
    /// An argument cannot be passed to `exec` (interior NUL byte).
    #[error("argument contains a NUL byte: {argument:?}")]
    InvalidArgument { argument: String },

    /// A redirection target could not be opened.
    #[error("cannot open '{path}': {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A process-control system call failed.
    #[error("{operation} failed: {source}")]
    Sys {
        operation: &'static str,
        source: nix::Error,
    },

    /// Pipe I/O with the child failed.
    #[error("I/O with {program} failed: {source}")]
    Io {
        program: String,
        source: std::io::Error,
    },

    /// The child was killed by a signal.
    #[error("{program} was terminated by signal {name} ({signal})")]
    Signaled {
        program: String,
        signal: i32,
        name: &'static str,
    },

    /// The child ended with a wait status that is neither exit nor signal.
    #[error("{program} ended with unexpected status: {status}")]
    UnexpectedStatus { program: String, status: String },
}

impl ExecError {
    pub(crate) fn sys(operation: &'static str) -> impl FnOnce(nix::Error) -> ExecError {
        move |source| ExecError::Sys { operation, source }
    }
}
