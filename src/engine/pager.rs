//! engine::pager
//!
//! Pager supervision.
//!
//! # Overview
//!
//! When output should be paged, [`with_pager`] splits the program into three
//! processes:
//!
//! ```text
//!                 supervisor (invoking process)
//!                 /                          \
//!   operation child  --- pipe (stdout) --->  pager child
//!   runs the rest of the program             sh -c "$PAGER"
//! ```
//!
//! The rest of the program is passed in as a continuation and only ever runs
//! in the operation child. The supervisor closes its pipe ends, waits for the
//! children, and exits with a single arbitrated status. It never returns.
//!
//! # Arbitration
//!
//! - Pager exits while the operation is still running: the operation gets
//!   `SIGTERM` and the pager's status is final.
//! - Operation exits first: its status is remembered (`SIGPIPE` counts as
//!   success) and the supervisor keeps waiting for the pager, whose exit then
//!   finalizes the remembered status.
//!
//! Signal deaths map to `128 + signal`. If both children exit at effectively
//! the same moment, whichever `wait` reports first wins; no stronger ordering
//! is attempted.

use std::ffi::CString;
use std::io::{IsTerminal, Write};
use std::os::fd::{AsRawFd, OwnedFd};

use nix::errno::Errno;
use nix::sys::signal::{kill, signal, SigHandler, Signal};
use nix::sys::wait::{wait, WaitStatus};
use nix::unistd::{dup2, execv, fork, ForkResult, Pid};
use thiserror::Error;

use super::monitor::pipe_cloexec;
use super::runner::EXEC_FAILED_STATUS;
use super::status::{shell_code, shell_code_ignoring_sigpipe};
use super::Context;
use crate::core::config::Paging;
use crate::ui::output;

/// Shell used to interpret the pager command line.
pub const SHELL: &str = "/bin/sh";

/// Errors from setting up or supervising a pager session.
#[derive(Debug, Error)]
pub enum PagerError {
    /// The pager command cannot be passed to the shell.
    #[error("pager command contains a NUL byte")]
    InvalidCommand,

    /// A process-control system call failed.
    #[error("{operation} failed while setting up the pager: {source}")]
    Sys {
        operation: &'static str,
        source: nix::Error,
    },
}

fn sys(operation: &'static str) -> impl FnOnce(nix::Error) -> PagerError {
    move |source| PagerError::Sys { operation, source }
}

/// Pick the pager to use, or `None` to run without one.
///
/// No pager runs in dry-run mode, when none is configured, when paging is
/// off, or (in [`Paging::Auto`]) when stdout is not a terminal.
pub fn select_pager<'a>(
    ctx: &Context,
    pager: Option<&'a str>,
    paging: Paging,
    stdout_is_terminal: bool,
) -> Option<&'a str> {
    if ctx.dry_run {
        return None;
    }
    let pager = pager.filter(|p| !p.trim().is_empty())?;
    match paging {
        Paging::Never => None,
        Paging::Always => Some(pager),
        Paging::Auto => stdout_is_terminal.then_some(pager),
    }
}

/// Run `operation` with its stdout piped into `pager`, then exit.
///
/// `operation` is the rest of the program and returns its exit status.
/// Without a pager it runs in this process; with one it runs in a forked
/// child while this process supervises. Either way the process exits with
/// the final status and this function never returns.
pub fn with_pager<F>(ctx: &Context, pager: Option<&str>, paging: Paging, operation: F) -> !
where
    F: FnOnce() -> i32,
{
    let Some(pager) = select_pager(ctx, pager, paging, std::io::stdout().is_terminal()) else {
        finish(operation());
    };

    output::debug(format!("paging through: {}", pager), ctx.verbosity());
    let session = match PagerSession::start(pager, operation) {
        Ok(session) => session,
        Err(e) => {
            output::error(e);
            finish(1);
        }
    };
    match session.supervise() {
        Ok(status) => finish(status),
        Err(e) => {
            output::error(e);
            finish(1);
        }
    }
}

/// Flush stdout and exit with `status`.
fn finish(status: i32) -> ! {
    let _ = std::io::stdout().flush();
    std::process::exit(status)
}

/// The two children of a running pager session.
#[derive(Debug)]
pub struct PagerSession {
    pager: Pid,
    operation: Pid,
}

impl PagerSession {
    /// Fork the pager and the operation, connected by a pipe.
    ///
    /// Returns in the supervisor only. The operation child runs `operation`
    /// and exits with its result.
    pub fn start<F>(pager_command: &str, operation: F) -> Result<Self, PagerError>
    where
        F: FnOnce() -> i32,
    {
        let shell = CString::new(SHELL).map_err(|_| PagerError::InvalidCommand)?;
        let script = CString::new(pager_command).map_err(|_| PagerError::InvalidCommand)?;
        let args = [
            CString::new("sh").map_err(|_| PagerError::InvalidCommand)?,
            CString::new("-c").map_err(|_| PagerError::InvalidCommand)?,
            script,
        ];

        let _ = std::io::stdout().flush();
        let (read, write) = pipe_cloexec().map_err(sys("pipe"))?;

        // SAFETY: the child only rewires stdin and execs, or exits.
        let pager = match unsafe { fork() }.map_err(sys("fork"))? {
            ForkResult::Child => run_pager(&shell, &args, read, write),
            ForkResult::Parent { child } => child,
        };

        // SAFETY: the child continues as an ordinary single-threaded copy of
        // this program; it never returns past `run_operation`.
        let operation = match unsafe { fork() }.map_err(sys("fork"))? {
            ForkResult::Child => run_operation(read, write, operation),
            ForkResult::Parent { child } => child,
        };

        drop(read);
        drop(write);
        Ok(Self { pager, operation })
    }

    /// Wait for the children and return the arbitrated exit status.
    pub fn supervise(self) -> Result<i32, PagerError> {
        let mut arbiter = Arbiter::default();
        loop {
            let status = match wait() {
                Ok(status) => status,
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(PagerError::Sys {
                    operation: "wait",
                    source: e,
                }),
            };
            let event = match status.pid() {
                Some(pid) if pid == self.pager => Event::PagerExited(status),
                Some(pid) if pid == self.operation => Event::OperationExited(status),
                _ => continue,
            };
            match arbiter.observe(event) {
                Decision::Continue => {}
                Decision::Finish {
                    status,
                    terminate_operation,
                } => {
                    if terminate_operation {
                        // Best effort: the operation may already be gone.
                        let _ = kill(self.operation, Signal::SIGTERM);
                    }
                    return Ok(status);
                }
            }
        }
    }
}

/// Pager child: read the pipe as stdin and exec the pager through the shell.
fn run_pager(shell: &CString, args: &[CString], read: OwnedFd, write: OwnedFd) -> ! {
    if dup2(read.as_raw_fd(), 0).is_err() {
        exit_child(EXEC_FAILED_STATUS);
    }
    drop(read);
    drop(write);
    // SAFETY: restoring the default disposition installs no handler.
    unsafe {
        let _ = signal(Signal::SIGPIPE, SigHandler::SigDfl);
    }
    let err = match execv(shell, args) {
        Err(e) => e,
        Ok(never) => match never {},
    };
    let _ = writeln!(std::io::stderr(), "ERROR: cannot execute pager: {}", err);
    exit_child(EXEC_FAILED_STATUS)
}

/// Operation child: write stdout into the pipe and run the continuation.
fn run_operation<F>(read: OwnedFd, write: OwnedFd, operation: F) -> !
where
    F: FnOnce() -> i32,
{
    if dup2(write.as_raw_fd(), 1).is_err() {
        exit_child(EXEC_FAILED_STATUS);
    }
    drop(read);
    drop(write);
    // Writing after the pager quits should end this process with SIGPIPE,
    // which the supervisor counts as success.
    // SAFETY: restoring the default disposition installs no handler.
    unsafe {
        let _ = signal(Signal::SIGPIPE, SigHandler::SigDfl);
    }
    finish(operation())
}

fn exit_child(status: i32) -> ! {
    // SAFETY: _exit skips destructors of state copied from the parent.
    unsafe { nix::libc::_exit(status) }
}

/// A child exit observed by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    PagerExited(WaitStatus),
    OperationExited(WaitStatus),
}

/// What the supervisor does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Keep waiting.
    Continue,
    /// Exit with `status`, first terminating the operation if asked.
    Finish {
        status: i32,
        terminate_operation: bool,
    },
}

/// Exit status arbitration between the pager and the operation.
#[derive(Debug, Default)]
pub struct Arbiter {
    remembered: Option<i32>,
}

impl Arbiter {
    /// The operation's status, once it has exited.
    pub fn remembered(&self) -> Option<i32> {
        self.remembered
    }

    /// Feed one observed exit.
    pub fn observe(&mut self, event: Event) -> Decision {
        match event {
            Event::OperationExited(status) => {
                if let Some(code) = shell_code_ignoring_sigpipe(status) {
                    self.remembered = Some(code);
                }
                Decision::Continue
            }
            Event::PagerExited(status) => {
                let Some(pager_code) = shell_code(status) else {
                    return Decision::Continue;
                };
                match self.remembered {
                    Some(code) => Decision::Finish {
                        status: code,
                        terminate_operation: false,
                    },
                    None => Decision::Finish {
                        status: pager_code,
                        terminate_operation: true,
                    },
                }
            }
        }
    }
}
