//! config command - Show or change configuration values

use anyhow::{bail, Context as _, Result};
use serde_json::json;

use crate::core::config::{Config, ConfigFile, Paging, PagerConfig};
use crate::engine::Context;
use crate::ui::output;

/// Show the resolved configuration.
pub fn show(config: &Config, json: bool) -> Result<i32> {
    let source = config
        .loaded_from()
        .map(|p| p.display().to_string());

    if json {
        let value = json!({
            "config_file": source,
            "verbose": config.verbose(),
            "debug": config.debug(),
            "pager": config.pager_command(),
            "paging": config.paging(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!(
            "config_file = {}",
            source.as_deref().unwrap_or("(none, using defaults)")
        );
        println!("verbose = {}", config.verbose());
        println!("debug = {}", config.debug());
        println!("pager = {}", config.pager_command().unwrap_or("(none)"));
        println!("paging = {:?}", config.paging());
    }
    Ok(0)
}

/// Set a value in the config file in use (or the canonical one).
pub fn set(ctx: &Context, config: &Config, key: &str, value: &str) -> Result<i32> {
    let path = match config.loaded_from() {
        Some(path) => path.to_path_buf(),
        None => Config::canonical_path()?,
    };
    let mut file = config.file.clone();
    apply(&mut file, key, value)?;

    Config::write_file(&path, &file)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    output::print(format!("Set {} = {}", key, value), ctx.verbosity());
    Ok(0)
}

/// Print the path of the config file in use.
pub fn path(config: &Config) -> Result<i32> {
    match config.loaded_from() {
        Some(path) => println!("{}", path.display()),
        None => println!("{}", Config::canonical_path()?.display()),
    }
    Ok(0)
}

/// Apply `key = value` to a config file.
pub fn apply(file: &mut ConfigFile, key: &str, value: &str) -> Result<()> {
    match key {
        "verbose" => {
            file.verbose = Some(value.parse().context("verbose must be true or false")?);
        }
        "debug" => {
            file.debug = Some(value.parse().context("debug must be a number")?);
        }
        "pager.command" | "pager" => {
            file.pager.get_or_insert_with(PagerConfig::default).command = Some(value.to_string());
        }
        "pager.paging" | "paging" => {
            let paging = match value {
                "auto" => Paging::Auto,
                "always" => Paging::Always,
                "never" => Paging::Never,
                _ => bail!("paging must be one of: auto, always, never"),
            };
            file.pager.get_or_insert_with(PagerConfig::default).paging = Some(paging);
        }
        _ => bail!("Unknown configuration key: {}", key),
    }
    file.validate()?;
    Ok(())
}
