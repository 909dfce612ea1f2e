//! engine::runner
//!
//! Spawn a command and drive its I/O to completion.
//!
//! # Overview
//!
//! [`Runner::run`] is the general form: it can feed bytes to the child's
//! stdin, capture stdout and stderr, and send stdout straight to a file, all
//! at once. [`Runner::execute`], [`Runner::capture`] and [`Runner::inject`]
//! are the common special cases.
//!
//! # Why a readiness loop
//!
//! Writing all input first and reading output afterwards deadlocks as soon
//! as both directions exceed the pipe buffer: the child blocks writing
//! output nobody reads while the parent blocks writing input nobody reads.
//! The loop here waits on every open pipe at once and services whichever is
//! ready, so progress never depends on ordering.
//!
//! # Example
//!
//! ```no_run
//! use omnivc::core::command::Command;
//! use omnivc::engine::{Context, Runner};
//!
//! let runner = Runner::new(Context::default());
//! let cmd = Command::builder("git").arg("status").arg("--short").build();
//! let (status, lines) = runner.capture(&cmd)?;
//! # Ok::<(), omnivc::engine::ExecError>(())
//! ```

use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::fd::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollTimeout};
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::unistd::{dup2, execvp, fork, ForkResult, Pid};

use super::monitor::{Direction, Monitor};
use super::{status, Context, ExecError};
use crate::core::command::Command;
use crate::ui::output;

/// Exit status of a child whose program could not be executed.
pub const EXEC_FAILED_STATUS: i32 = 127;

const STDIN: RawFd = 0;
const STDOUT: RawFd = 1;
const STDERR: RawFd = 2;
const NULL_DEVICE: &str = "/dev/null";

/// What to connect to the child's standard descriptors.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Bytes to feed to stdin. `None` leaves stdin inherited.
    pub input: Option<Vec<u8>>,
    /// Collect stdout.
    pub capture_stdout: bool,
    /// Collect stderr.
    pub capture_stderr: bool,
    /// Send stdout to this file (created or truncated). Takes precedence over
    /// `capture_stdout`.
    pub output_file: Option<PathBuf>,
    /// Connect stdin to the null device (unless `input` is set).
    pub null_stdin: bool,
    /// Connect stdout to the null device (unless captured or redirected).
    pub null_stdout: bool,
    /// Connect stderr to the null device (unless captured).
    pub null_stderr: bool,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.input = Some(bytes.into());
        self
    }

    pub fn capture_stdout(mut self) -> Self {
        self.capture_stdout = true;
        self
    }

    pub fn capture_stderr(mut self) -> Self {
        self.capture_stderr = true;
        self
    }

    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    pub fn null_stdin(mut self) -> Self {
        self.null_stdin = true;
        self
    }

    pub fn null_stdout(mut self) -> Self {
        self.null_stdout = true;
        self
    }

    pub fn null_stderr(mut self) -> Self {
        self.null_stderr = true;
        self
    }

    fn wants_stdout_monitor(&self) -> bool {
        self.capture_stdout && self.output_file.is_none()
    }

    /// Descriptors that end up on the null device. A feed, a capture or an
    /// output file on the same descriptor takes precedence.
    fn null_targets(&self) -> Vec<RawFd> {
        let mut targets = Vec::new();
        if self.null_stdin && self.input.is_none() {
            targets.push(STDIN);
        }
        if self.null_stdout && !self.capture_stdout && self.output_file.is_none() {
            targets.push(STDOUT);
        }
        if self.null_stderr && !self.capture_stderr {
            targets.push(STDERR);
        }
        targets
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    /// Exit code of the child (0..=255).
    pub status: i32,
    /// Captured stdout, if requested and not redirected to a file.
    pub stdout: Option<Vec<u8>>,
    /// Captured stderr, if requested.
    pub stderr: Option<Vec<u8>>,
}

impl RunOutput {
    /// Whether the child exited with status 0.
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Captured stdout split into lines.
    pub fn stdout_lines(&self) -> Vec<String> {
        self.stdout.as_deref().map(split_lines).unwrap_or_default()
    }

    /// Captured stderr split into lines.
    pub fn stderr_lines(&self) -> Vec<String> {
        self.stderr.as_deref().map(split_lines).unwrap_or_default()
    }
}

/// Split captured output on `\n`.
///
/// The empty piece after a final newline is dropped, so joining the result
/// with `\n` and appending `\n` reproduces newline-terminated input exactly.
/// Interior and other trailing empty lines are kept; trimming them is up to
/// the caller.
///
/// ```
/// use omnivc::engine::split_lines;
///
/// assert_eq!(split_lines(b"foo\n\nbar\n"), ["foo", "", "bar"]);
/// assert_eq!(split_lines(b"no newline"), ["no newline"]);
/// assert!(split_lines(b"").is_empty());
/// ```
pub fn split_lines(bytes: &[u8]) -> Vec<String> {
    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    if bytes.is_empty() {
        return Vec::new();
    }
    body.split(|&b| b == b'\n')
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .collect()
}

/// Runs commands under an execution [`Context`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Runner {
    ctx: Context,
}

impl Runner {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Run with inherited stdio; return the exit code.
    pub fn execute(&self, command: &Command) -> Result<i32, ExecError> {
        Ok(self.run(command, RunOptions::new())?.status)
    }

    /// Run capturing stdout; return the exit code and the output lines.
    pub fn capture(&self, command: &Command) -> Result<(i32, Vec<String>), ExecError> {
        let out = self.run(command, RunOptions::new().capture_stdout())?;
        let lines = out.stdout_lines();
        Ok((out.status, lines))
    }

    /// Run feeding `lines` (each terminated by `\n`) to stdin; return the
    /// exit code.
    pub fn inject<S: AsRef<str>>(&self, lines: &[S], command: &Command) -> Result<i32, ExecError> {
        let mut input = Vec::new();
        for line in lines {
            input.extend_from_slice(line.as_ref().as_bytes());
            input.push(b'\n');
        }
        Ok(self.run(command, RunOptions::new().input(input))?.status)
    }

    /// Run `command` with the given stdio wiring.
    ///
    /// # Errors
    ///
    /// Every error is fatal: failure to set up pipes or fork, I/O failure on
    /// a pipe, or the child being killed by a signal. A program that cannot
    /// be executed is not an error; it yields [`EXEC_FAILED_STATUS`].
    pub fn run(&self, command: &Command, mut options: RunOptions) -> Result<RunOutput, ExecError> {
        let verbosity = self.ctx.verbosity();
        output::command(command.display_line(), self.ctx.echo_verbosity());

        if self.ctx.dry_run {
            return Ok(RunOutput {
                status: 0,
                stdout: options.wants_stdout_monitor().then(Vec::new),
                stderr: options.capture_stderr.then(Vec::new),
            });
        }

        let argv = exec_args(command)?;
        let null_targets = options.null_targets();
        let output_file = options
            .output_file
            .as_deref()
            .map(open_truncate)
            .transpose()?;
        let null = if null_targets.is_empty() {
            None
        } else {
            Some(open_null()?)
        };

        let mut monitors = Vec::new();
        if let Some(input) = options.input.take() {
            output::trace_bytes("stdin", &input, verbosity);
            monitors.push(Monitor::feed(STDIN, input).map_err(ExecError::sys("pipe"))?);
        }
        if options.wants_stdout_monitor() {
            monitors.push(Monitor::drain(STDOUT).map_err(ExecError::sys("pipe"))?);
        }
        if options.capture_stderr {
            monitors.push(Monitor::drain(STDERR).map_err(ExecError::sys("pipe"))?);
        }

        let redirects = Redirects::plan(output_file.as_ref(), null.as_ref(), &null_targets);

        // SAFETY: the child only rewires descriptors and execs, or exits.
        let pid = match unsafe { fork() }.map_err(ExecError::sys("fork"))? {
            ForkResult::Child => exec_child(&argv, &mut monitors, &redirects),
            ForkResult::Parent { child } => child,
        };
        output::debug(
            format!("spawned {} as pid {}", command.program(), pid),
            verbosity,
        );

        drop(output_file);
        drop(null);
        let wired = monitors.iter_mut().try_for_each(Monitor::wire_parent);
        if let Err(source) = wired {
            abandon(monitors, pid);
            return Err(ExecError::sys("fcntl")(source));
        }

        let pumped = pump(&mut monitors);
        if let Err(source) = pumped {
            abandon(monitors, pid);
            return Err(ExecError::Io {
                program: command.program().to_string(),
                source,
            });
        }

        let code = reap(command, pid)?;
        output::debug(
            format!("{} exited with status {}", command.program(), code),
            verbosity,
        );

        let mut out = RunOutput {
            status: code,
            stdout: None,
            stderr: None,
        };
        for monitor in monitors {
            match (monitor.direction(), monitor.target()) {
                (Direction::Drain, STDOUT) => {
                    output::trace_bytes("stdout", monitor.transferred(), verbosity);
                    out.stdout = Some(monitor.into_data());
                }
                (Direction::Drain, STDERR) => {
                    output::trace_bytes("stderr", monitor.transferred(), verbosity);
                    out.stderr = Some(monitor.into_data());
                }
                _ => {}
            }
        }
        Ok(out)
    }
}

/// Descriptor redirections applied in the child after monitor wiring.
struct Redirects {
    /// `(source, target)` pairs for `dup2`.
    pairs: Vec<(RawFd, RawFd)>,
}

impl Redirects {
    fn plan(output_file: Option<&File>, null: Option<&File>, null_targets: &[RawFd]) -> Self {
        let mut pairs = Vec::new();
        if let Some(file) = output_file {
            pairs.push((file.as_raw_fd(), STDOUT));
        }
        if let Some(null) = null {
            let fd = null.as_raw_fd();
            pairs.extend(null_targets.iter().map(|&target| (fd, target)));
        }
        Self { pairs }
    }
}

/// Child side of the fork. Never returns.
fn exec_child(argv: &[CString], monitors: &mut [Monitor], redirects: &Redirects) -> ! {
    for monitor in monitors.iter_mut() {
        if let Err(e) = monitor.wire_child() {
            child_abort(&format!("cannot wire descriptor {}: {}", monitor.target(), e));
        }
    }
    for &(source, target) in &redirects.pairs {
        if let Err(e) = dup2(source, target) {
            child_abort(&format!("cannot redirect descriptor {}: {}", target, e));
        }
    }

    // Rust ignores SIGPIPE; the program we exec should not inherit that.
    // SAFETY: restoring the default disposition installs no handler.
    unsafe {
        let _ = signal(Signal::SIGPIPE, SigHandler::SigDfl);
    }

    let err = match execvp(&argv[0], argv) {
        Err(e) => e,
        Ok(never) => match never {},
    };
    child_abort(&format!(
        "cannot execute {}: {}",
        argv[0].to_string_lossy(),
        err
    ))
}

/// Report a failure from a forked child and exit without unwinding.
fn child_abort(message: &str) -> ! {
    let line = format!("ERROR: {}\n", message);
    let _ = std::io::stderr().write_all(line.as_bytes());
    // SAFETY: _exit skips atexit handlers and destructors belonging to the
    // parent's copy of the process state.
    unsafe { nix::libc::_exit(EXEC_FAILED_STATUS) }
}

/// Close our pipe ends so the child cannot block on us, then reap it.
fn abandon(monitors: Vec<Monitor>, pid: Pid) {
    drop(monitors);
    let _ = status::wait_for(pid);
}

/// Ignores SIGPIPE until dropped, then restores the previous disposition.
///
/// A child that exits without reading its input must surface as `EPIPE` on
/// the feed, whatever disposition the calling process runs with. Under a
/// pager the operation process runs with the default one.
struct SigpipeIgnored {
    previous: Option<SigHandler>,
}

impl SigpipeIgnored {
    fn install() -> Self {
        // SAFETY: SIG_IGN installs no handler code.
        let previous = unsafe { signal(Signal::SIGPIPE, SigHandler::SigIgn) }.ok();
        Self { previous }
    }
}

impl Drop for SigpipeIgnored {
    fn drop(&mut self) {
        if let Some(previous) = self.previous {
            // SAFETY: reinstates the disposition that was in place before.
            unsafe {
                let _ = signal(Signal::SIGPIPE, previous);
            }
        }
    }
}

/// Drive every active monitor until all are inactive.
fn pump(monitors: &mut [Monitor]) -> std::io::Result<()> {
    let _sigpipe = SigpipeIgnored::install();
    loop {
        let mut active: Vec<&mut Monitor> = monitors.iter_mut().filter(|m| m.is_active()).collect();
        if active.is_empty() {
            return Ok(());
        }

        let ready: Vec<bool> = {
            let mut fds: Vec<PollFd<'_>> = active.iter().filter_map(|m| m.interest()).collect();
            match poll(&mut fds, PollTimeout::NONE) {
                Ok(_) => {}
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.into()),
            }
            fds.iter()
                .map(|fd| fd.revents().is_some_and(|r| !r.is_empty()))
                .collect()
        };

        for (monitor, ready) in active.iter_mut().zip(ready) {
            if ready {
                monitor.service()?;
            }
        }
    }
}

/// Wait for the child and turn its status into an exit code.
fn reap(command: &Command, pid: Pid) -> Result<i32, ExecError> {
    let waited = status::wait_for(pid).map_err(ExecError::sys("waitpid"))?;
    status::exit_code(command.program(), waited)
}

/// Convert the argument vector for `execvp`.
fn exec_args(command: &Command) -> Result<Vec<CString>, ExecError> {
    command
        .argv()
        .iter()
        .map(|arg| {
            CString::new(arg.as_bytes()).map_err(|_| ExecError::InvalidArgument {
                argument: arg.clone(),
            })
        })
        .collect()
}

fn open_truncate(path: &Path) -> Result<File, ExecError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|source| ExecError::Open {
            path: path.to_path_buf(),
            source,
        })
}

fn open_null() -> Result<File, ExecError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(NULL_DEVICE)
        .map_err(|source| ExecError::Open {
            path: PathBuf::from(NULL_DEVICE),
            source,
        })
}
