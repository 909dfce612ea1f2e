//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment (`OVC_PAGER`, then `PAGER` below the config file)
//! 4. CLI flags (not handled here)
//!
//! For the pager the order is `OVC_PAGER` > `pager.command` > `PAGER`, so a
//! configured pager wins over the generic system default but an explicit
//! per-tool override wins over both.
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$OVC_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/ovc/config.toml`
//! 3. `~/.ovc/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use omnivc::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! if let Some(pager) = config.pager_command() {
//!     println!("Pager: {}", pager);
//! }
//! println!("Debug level: {}", config.debug());
//! ```

pub mod schema;

pub use schema::{ConfigFile, Paging, PagerConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "OVC_CONFIG";
/// Tool-specific pager override.
pub const PAGER_ENV: &str = "OVC_PAGER";
/// Generic system pager.
pub const SYSTEM_PAGER_ENV: &str = "PAGER";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Configuration merged from the file and the environment.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed config file (defaults if none was found)
    pub file: ConfigFile,
    /// `$OVC_PAGER`, if set and non-empty
    pub pager_env: Option<String>,
    /// `$PAGER`, if set and non-empty
    pub system_pager_env: Option<String>,
    /// Path to the config file (if loaded)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the process environment and default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation. A missing file is not an error.
    pub fn load() -> Result<Config, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok(), dirs::home_dir())
    }

    /// Load configuration using `env` for variable lookup and `home` as the
    /// home directory.
    pub fn load_with<F>(env: F, home: Option<PathBuf>) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let path = Self::locate(&env, home);
        let file = match &path {
            Some(p) => Self::read_file(p)?,
            None => ConfigFile::default(),
        };
        file.validate()?;

        Ok(Config {
            file,
            pager_env: non_empty(PAGER_ENV),
            system_pager_env: non_empty(SYSTEM_PAGER_ENV),
            path,
        })
    }

    /// Find the first existing config file.
    fn locate<F>(env: &F, home: Option<PathBuf>) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        // 1. Check $OVC_CONFIG
        if let Some(path) = env(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/ovc/config.toml
        if let Some(xdg_home) = env("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("ovc/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.ovc/config.toml
        if let Some(home) = home {
            let path = home.join(".ovc/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Read and parse a config file.
    pub fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical config path, `~/.ovc/config.toml`.
    pub fn canonical_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".ovc/config.toml"))
    }

    /// Write a config file atomically (temp file, then rename).
    pub fn write_file(path: &Path, file: &ConfigFile) -> Result<(), ConfigError> {
        file.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(file).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut out = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        out.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        out.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Whether commands are echoed before running.
    ///
    /// Defaults to `false`.
    pub fn verbose(&self) -> bool {
        self.file.verbose.unwrap_or(false)
    }

    /// Debug level.
    ///
    /// Defaults to `0`.
    pub fn debug(&self) -> u8 {
        self.file.debug.unwrap_or(0)
    }

    /// The pager command line: `$OVC_PAGER`, then `pager.command`, then
    /// `$PAGER`.
    pub fn pager_command(&self) -> Option<&str> {
        self.pager_env
            .as_deref()
            .or_else(|| {
                self.file
                    .pager
                    .as_ref()
                    .and_then(|p| p.command.as_deref())
            })
            .or(self.system_pager_env.as_deref())
    }

    /// When to page.
    ///
    /// Defaults to [`Paging::Auto`].
    pub fn paging(&self) -> Paging {
        self.file
            .pager
            .as_ref()
            .and_then(|p| p.paging)
            .unwrap_or_default()
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn load_empty_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_with(env_of(&[]), Some(temp.path().to_path_buf())).unwrap();

        assert!(!config.verbose());
        assert_eq!(config.debug(), 0);
        assert_eq!(config.pager_command(), None);
        assert_eq!(config.paging(), Paging::Auto);
        assert!(config.loaded_from().is_none());
    }

    #[test]
    fn load_from_env_path() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("custom.toml");
        fs::write(
            &config_path,
            r#"
            verbose = true
            [pager]
            paging = "never"
            "#,
        )
        .unwrap();

        let config = Config::load_with(
            env_of(&[(CONFIG_ENV, config_path.to_str().unwrap())]),
            None,
        )
        .unwrap();

        assert!(config.verbose());
        assert_eq!(config.paging(), Paging::Never);
        assert_eq!(config.loaded_from(), Some(config_path.as_path()));
    }

    #[test]
    fn load_from_xdg_before_home() {
        let xdg = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        fs::create_dir_all(xdg.path().join("ovc")).unwrap();
        fs::write(xdg.path().join("ovc/config.toml"), "debug = 1").unwrap();
        fs::create_dir_all(home.path().join(".ovc")).unwrap();
        fs::write(home.path().join(".ovc/config.toml"), "debug = 2").unwrap();

        let config = Config::load_with(
            env_of(&[("XDG_CONFIG_HOME", xdg.path().to_str().unwrap())]),
            Some(home.path().to_path_buf()),
        )
        .unwrap();

        assert_eq!(config.debug(), 1);
    }

    #[test]
    fn pager_precedence() {
        let home = TempDir::new().unwrap();
        fs::create_dir_all(home.path().join(".ovc")).unwrap();
        fs::write(
            home.path().join(".ovc/config.toml"),
            "[pager]\ncommand = \"most\"",
        )
        .unwrap();
        let home = Some(home.path().to_path_buf());

        let only_system = Config::load_with(env_of(&[(SYSTEM_PAGER_ENV, "more")]), None).unwrap();
        assert_eq!(only_system.pager_command(), Some("more"));

        let file_beats_system =
            Config::load_with(env_of(&[(SYSTEM_PAGER_ENV, "more")]), home.clone()).unwrap();
        assert_eq!(file_beats_system.pager_command(), Some("most"));

        let tool_env_wins = Config::load_with(
            env_of(&[(SYSTEM_PAGER_ENV, "more"), (PAGER_ENV, "less -R")]),
            home,
        )
        .unwrap();
        assert_eq!(tool_env_wins.pager_command(), Some("less -R"));
    }

    #[test]
    fn blank_env_pager_ignored() {
        let config = Config::load_with(env_of(&[(PAGER_ENV, " ")]), None).unwrap();
        assert_eq!(config.pager_command(), None);
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "verbose = true\nunknown_field = 1").unwrap();

        let result = Config::load_with(env_of(&[(CONFIG_ENV, path.to_str().unwrap())]), None);
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn invalid_values_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "debug = 9").unwrap();

        let result = Config::load_with(env_of(&[(CONFIG_ENV, path.to_str().unwrap())]), None);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn write_file_atomic() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.toml");
        let file = ConfigFile {
            debug: Some(1),
            ..Default::default()
        };

        Config::write_file(&path, &file).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("toml.tmp").exists());
        assert_eq!(Config::read_file(&path).unwrap(), file);
    }
}
