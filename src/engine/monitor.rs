//! engine::monitor
//!
//! One half-duplex pipe between the parent and a standard descriptor of a
//! child process.
//!
//! # Lifecycle
//!
//! 1. **Created** before `fork`, owning both ends of a fresh pipe
//! 2. **Wired in the child**: the child end is duplicated onto the target
//!    descriptor and both pipe ends are closed
//! 3. **Wired in the parent**: the child end is closed
//! 4. **Active** while the parent end is open
//! 5. **Inactive** once a feed has written its whole buffer, or a drain has
//!    read end-of-file; the parent end is closed at that point
//!
//! # Invariants
//!
//! - Bytes within one monitor's stream are never reordered
//! - Pipe ends are close-on-exec until wired, so a child spawned elsewhere in
//!   the same process never inherits them

use std::fs::File;
use std::io::{self, ErrorKind, Read, Write};
use std::os::fd::{AsFd, AsRawFd, IntoRawFd, OwnedFd, RawFd};

use nix::fcntl::{fcntl, FcntlArg, FdFlag, OFlag};
use nix::poll::{PollFd, PollFlags};
use nix::unistd::dup2;

/// Size of one bounded read from a drain.
pub const READ_CHUNK: usize = 64 * 1024;

/// Which way bytes flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Parent writes, child reads (target is fd 0).
    Feed,
    /// Child writes, parent reads (target is fd 1 or 2).
    Drain,
}

/// A pipe connecting the parent to one child descriptor.
#[derive(Debug)]
pub struct Monitor {
    target: RawFd,
    direction: Direction,
    parent_end: Option<File>,
    child_end: Option<OwnedFd>,
    /// Feed: bytes to send. Drain: bytes received.
    data: Vec<u8>,
    /// Feed only: how much of `data` has been written.
    written: usize,
}

impl Monitor {
    /// A monitor that feeds `data` to the child's `target` descriptor.
    pub fn feed(target: RawFd, data: Vec<u8>) -> nix::Result<Self> {
        let (read, write) = pipe_cloexec()?;
        Ok(Self {
            target,
            direction: Direction::Feed,
            parent_end: Some(File::from(write)),
            child_end: Some(read),
            data,
            written: 0,
        })
    }

    /// A monitor that collects everything the child writes to `target`.
    pub fn drain(target: RawFd) -> nix::Result<Self> {
        let (read, write) = pipe_cloexec()?;
        Ok(Self {
            target,
            direction: Direction::Drain,
            parent_end: Some(File::from(read)),
            child_end: Some(write),
            data: Vec::new(),
            written: 0,
        })
    }

    /// The child descriptor this monitor is attached to.
    pub fn target(&self) -> RawFd {
        self.target
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the parent end is still open.
    pub fn is_active(&self) -> bool {
        self.parent_end.is_some()
    }

    /// Child side of the fork: put the child end on the target descriptor
    /// and close both pipe ends.
    pub fn wire_child(&mut self) -> nix::Result<()> {
        self.parent_end = None;
        if let Some(end) = self.child_end.take() {
            if end.as_raw_fd() == self.target {
                // Already in place; dup2 would be a no-op and keep CLOEXEC.
                fcntl(end.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::empty()))?;
                let _ = end.into_raw_fd();
            } else {
                dup2(end.as_raw_fd(), self.target)?;
            }
        }
        Ok(())
    }

    /// Parent side of the fork: close the child end.
    ///
    /// A feed end is switched to non-blocking so a write never waits for
    /// more room than the pipe reported.
    pub fn wire_parent(&mut self) -> nix::Result<()> {
        self.child_end = None;
        if self.direction == Direction::Feed {
            if let Some(end) = &self.parent_end {
                let fd = end.as_raw_fd();
                let flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
                fcntl(fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;
            }
        }
        Ok(())
    }

    /// Declare readiness interest on the parent end, if still active.
    pub fn interest(&self) -> Option<PollFd<'_>> {
        let events = match self.direction {
            Direction::Feed => PollFlags::POLLOUT,
            Direction::Drain => PollFlags::POLLIN,
        };
        self.parent_end
            .as_ref()
            .map(|end| PollFd::new(end.as_fd(), events))
    }

    /// Make progress after the parent end was reported ready.
    ///
    /// A feed writes as much of its remaining buffer as the pipe accepts, or
    /// closes if nothing is left. A drain reads one chunk, or closes on
    /// end-of-file.
    pub fn service(&mut self) -> io::Result<()> {
        match self.direction {
            Direction::Feed => self.service_feed(),
            Direction::Drain => self.service_drain(),
        }
    }

    fn service_feed(&mut self) -> io::Result<()> {
        if self.written >= self.data.len() {
            self.close();
            return Ok(());
        }
        let Some(end) = self.parent_end.as_mut() else {
            return Ok(());
        };
        match end.write(&self.data[self.written..]) {
            Ok(n) => self.written += n,
            Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {}
            // The child closed its input early; nothing more can be sent.
            Err(e) if e.kind() == ErrorKind::BrokenPipe => self.close(),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn service_drain(&mut self) -> io::Result<()> {
        let Some(end) = self.parent_end.as_mut() else {
            return Ok(());
        };
        let mut chunk = vec![0u8; READ_CHUNK];
        match end.read(&mut chunk) {
            Ok(0) => self.close(),
            Ok(n) => self.data.extend_from_slice(&chunk[..n]),
            Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {}
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Deactivate: close the parent end.
    pub fn close(&mut self) {
        self.parent_end = None;
    }

    /// Bytes fed so far (feed) or received (drain).
    pub fn transferred(&self) -> &[u8] {
        match self.direction {
            Direction::Feed => &self.data[..self.written],
            Direction::Drain => &self.data,
        }
    }

    /// Consume the monitor, returning its buffer.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Create a pipe whose both ends are close-on-exec.
#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
pub(crate) fn pipe_cloexec() -> nix::Result<(OwnedFd, OwnedFd)> {
    nix::unistd::pipe2(OFlag::O_CLOEXEC)
}

/// Create a pipe whose both ends are close-on-exec.
#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
pub(crate) fn pipe_cloexec() -> nix::Result<(OwnedFd, OwnedFd)> {
    let (read, write) = nix::unistd::pipe()?;
    for end in [&read, &write] {
        fcntl(end.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
    }
    Ok((read, write))
}
