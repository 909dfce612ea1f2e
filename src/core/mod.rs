//! core
//!
//! Core types for command assembly and configuration.
//!
//! # Modules
//!
//! - [`command`] - Argument descriptors and shell-free command assembly
//! - [`escape`] - Backend-specific percent escaping
//! - [`quote`] - Shell-quoted display lines for logging
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Assembly is pure: no filesystem access, no processes
//! - Descriptor kinds form a closed enum, so a malformed descriptor cannot
//!   be constructed

pub mod command;
pub mod config;
pub mod escape;
pub mod quote;
