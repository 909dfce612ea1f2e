//! omnivc - A uniform front-end over native version-control tools
//!
//! omnivc translates a small uniform verb set into each backend's own
//! command line and runs it as a subprocess. This crate is the process
//! execution core that every backend goes through.
//!
//! # Architecture
//!
//! - [`core`] - Command assembly, backend escaping, configuration
//! - [`engine`] - Subprocess I/O engine and pager supervision
//! - [`cli`] - Thin command-line driver (`ovc`)
//! - [`ui`] - Output and diagnostic logging
//!
//! # Correctness Invariants
//!
//! 1. Commands are argument vectors; nothing is ever run through a shell
//!    except the user's own pager command line
//! 2. Feeding input and draining output never deadlock, whatever the sizes
//! 3. A child killed by a signal aborts the program; it is never a value
//! 4. Under a pager, exactly one exit status is reported for the program

pub mod cli;
pub mod core;
pub mod engine;
pub mod ui;
