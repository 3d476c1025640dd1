//! Handlers for `landmem config {path,get,set,init,export}`.

use std::path::{Path, PathBuf};

use landmem_core::{Error, Result};

use crate::cli::ConfigAction;
use crate::config::LandmemConfig;

/// Handle a config subcommand.
///
/// Receives the raw `--config` path (not a loaded config) because `path`
/// and `init` work before a config file exists.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => {
            let path = LandmemConfig::resolve_config_path(config_path).ok_or_else(|| {
                Error::config("Could not determine config directory for this platform")
            })?;
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("(file does not exist; run `landmem config init` to create it)");
            }
            Ok(())
        }
        ConfigAction::Get { key } => {
            println!("{}", config_get(&LandmemConfig::load(config_path)?, &key)?);
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let path = LandmemConfig::resolve_config_path(config_path)
                .ok_or_else(|| Error::config("Could not determine config directory"))?;
            config_set(&path, &key, &value)?;
            println!("Set {key} = {value} in {}", path.display());
            Ok(())
        }
        ConfigAction::Init { file, force } => {
            let path = match file {
                Some(p) => PathBuf::from(p),
                None => LandmemConfig::default_config_path()
                    .ok_or_else(|| Error::config("Could not determine config directory"))?,
            };
            config_init(&path, force)?;
            println!("Config file created at {}", path.display());
            Ok(())
        }
        ConfigAction::Export { docker_env } => {
            let config = LandmemConfig::load(config_path)?;
            for (key, value) in config.to_env_vars()? {
                if docker_env {
                    println!("--env {key}={value}");
                } else {
                    println!("{key}={value}");
                }
            }
            Ok(())
        }
    }
}

/// Look up a dotted key in the resolved configuration.
fn config_get(config: &LandmemConfig, key: &str) -> Result<String> {
    let value = toml::Value::try_from(config).map_err(|e| Error::config(e.to_string()))?;
    get_nested_value(&value, key)
        .map(format_toml_value)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))
}

/// Set a dotted key in an existing config file, then check the file still
/// parses as a configuration.
fn config_set(path: &Path, key: &str, value: &str) -> Result<()> {
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `landmem config init` first.",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    let mut doc: toml::Value = toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;

    set_nested_value(&mut doc, key, parse_value(value))?;
    let toml_str = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    toml::from_str::<LandmemConfig>(&toml_str)
        .map_err(|e| Error::config(format!("Invalid value for '{key}': {e}")))?;

    std::fs::write(path, toml_str).map_err(|e| Error::io_with_path(e, path))
}

/// Write a default configuration file.
fn config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }
    let toml_str = LandmemConfig::default().to_toml_string()?;
    std::fs::write(path, toml_str).map_err(|e| Error::io_with_path(e, path))
}

// ============================================================================
// TOML dotted-key helpers
// ============================================================================

fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Set a value at a dotted key path, creating intermediate tables as needed.
fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let mut parts = key.split('.').peekable();
    let mut current = root;

    while let Some(part) = parts.next() {
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::config(format!("Cannot set '{key}': '{part}' is not a table")))?;
        if parts.peek().is_none() {
            table.insert(part.to_string(), value);
            return Ok(());
        }
        current = table
            .entry(part)
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    Err(Error::config("Empty key path"))
}

/// Parse a string into a TOML value: bool, then integer, then float, then string.
fn parse_value(s: &str) -> toml::Value {
    match s {
        "true" => toml::Value::Boolean(true),
        "false" => toml::Value::Boolean(false),
        _ => s
            .parse::<i64>()
            .map(toml::Value::Integer)
            .or_else(|_| s.parse::<f64>().map(toml::Value::Float))
            .unwrap_or_else(|_| toml::Value::String(s.to_string())),
    }
}

fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
