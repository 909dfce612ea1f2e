//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Location
//!
//! Searched in order:
//! 1. `$OVC_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/ovc/config.toml`
//! 3. `~/.ovc/config.toml` (canonical write location)
//!
//! # Validation
//!
//! Values are validated after parsing: the debug level is bounded and a
//! configured pager command must not be blank.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Highest supported debug level.
pub const MAX_DEBUG_LEVEL: u8 = 2;

/// When to interpose a pager on command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Paging {
    /// Page only when stdout is a terminal.
    #[default]
    Auto,
    /// Page even when stdout is not a terminal.
    Always,
    /// Never page.
    Never,
}

/// The configuration file.
///
/// # Example
///
/// ```toml
/// verbose = false
/// debug = 0
///
/// [pager]
/// command = "less -R"
/// paging = "auto"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Echo each command before running it
    pub verbose: Option<bool>,

    /// Debug level (0 = off, 1 = commands, 2 = commands and I/O bytes)
    pub debug: Option<u8>,

    /// Pager settings
    pub pager: Option<PagerConfig>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(level) = self.debug {
            if level > MAX_DEBUG_LEVEL {
                return Err(ConfigError::InvalidValue(format!(
                    "debug level {} out of range, must be 0..={}",
                    level, MAX_DEBUG_LEVEL
                )));
            }
        }

        if let Some(pager) = &self.pager {
            pager.validate()?;
        }

        Ok(())
    }
}

/// Pager settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PagerConfig {
    /// Shell command line of the pager
    pub command: Option<String>,

    /// When to page
    pub paging: Option<Paging>,
}

impl PagerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(command) = &self.command {
            if command.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "pager.command must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
