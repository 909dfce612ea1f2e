//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and diagnostic logging
//!
//! # Design
//!
//! All diagnostics go through this module so verbosity is handled in one
//! place and never mixes with a command's own output.

pub mod output;
