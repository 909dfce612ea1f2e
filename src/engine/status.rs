//! engine::status
//!
//! Interpretation of child wait statuses.

use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;

use super::ExecError;

/// Offset added to a signal number to form a shell-style exit status.
pub const SIGNAL_STATUS_BASE: i32 = 128;

/// Block until `pid` changes state, retrying on `EINTR`.
pub fn wait_for(pid: Pid) -> nix::Result<WaitStatus> {
    loop {
        match waitpid(pid, None) {
            Err(Errno::EINTR) => continue,
            other => return other,
        }
    }
}

/// Exit code of a child run by the engine.
///
/// Only a normal exit yields a value. A signal death, or any other status,
/// is fatal.
pub fn exit_code(program: &str, status: WaitStatus) -> Result<i32, ExecError> {
    match status {
        WaitStatus::Exited(_, code) => Ok(code),
        WaitStatus::Signaled(_, signal, _) => Err(ExecError::Signaled {
            program: program.to_string(),
            signal: signal as i32,
            name: signal.as_str(),
        }),
        other => Err(ExecError::UnexpectedStatus {
            program: program.to_string(),
            status: format!("{:?}", other),
        }),
    }
}

/// Shell-style status: the exit code, or `128 + n` for death by signal `n`.
///
/// Returns `None` for statuses that do not mean the process is gone.
pub fn shell_code(status: WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Exited(_, code) => Some(code),
        WaitStatus::Signaled(_, signal, _) => Some(SIGNAL_STATUS_BASE + signal as i32),
        _ => None,
    }
}

/// Like [`shell_code`], but death by `SIGPIPE` counts as success.
///
/// A command writing into a pager that has already quit gets `SIGPIPE`;
/// that is the normal way for such a command to end.
pub fn shell_code_ignoring_sigpipe(status: WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Signaled(_, Signal::SIGPIPE, _) => Some(0),
        other => shell_code(other),
    }
}
