//! ui::output
//!
//! Output formatting and diagnostic logging.
//!
//! # Design
//!
//! Diagnostics go to stderr so they never mix with a command's own stdout
//! (which may be captured or piped into a pager). Levels are cumulative:
//! anything shown at `Verbose` is also shown at `Debug` and `Trace`.

use std::fmt::Display;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Quiet mode - errors only
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Verbose mode - echo commands before running them
    Verbose,
    /// Debug mode (level 1) - commands plus engine decisions
    Debug,
    /// Trace mode (debug level 2) - also echo fed and captured bytes
    Trace,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, verbose: bool, debug: u8) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug >= 2 {
            Verbosity::Trace
        } else if debug == 1 {
            Verbosity::Debug
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Echo a command display line (verbose and above).
pub fn command(line: impl Display, verbosity: Verbosity) {
    if verbosity >= Verbosity::Verbose {
        eprintln!("+ {}", line);
    }
}

/// Print a debug message (debug level 1 and above).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity >= Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Echo raw bytes on a labelled stream (debug level 2 only).
pub fn trace_bytes(label: &str, bytes: &[u8], verbosity: Verbosity) {
    if verbosity >= Verbosity::Trace {
        eprintln!(
            "[trace] {} ({} bytes): {}",
            label,
            bytes.len(),
            String::from_utf8_lossy(bytes).escape_debug()
        );
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("ERROR: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}
