//! Configuration file loading for the walkmod CLI.
//!
//! Discovers and loads `.walkmod.toml` from the project directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;
use walkmod_core::settings::DEFAULT_BACKUP_SUFFIX;
use walkmod_types::{DocumentFormat, Params};

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = ".walkmod.toml";

/// Top-level configuration from .walkmod.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WalkmodConfig {
    /// Defaults for every edit command.
    pub defaults: DefaultsConfig,

    /// Backup settings.
    pub backups: BackupsConfig,
}

/// Defaults section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Document format used when none is detected or given.
    pub format: Option<DocumentFormat>,

    /// Propagate edits into modules.
    pub recursive: bool,

    /// Never write; print the patch instead.
    pub dry_run: bool,
}

/// Backups section of the config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BackupsConfig {
    /// Whether to copy a document before overwriting it.
    pub enabled: bool,

    /// Suffix for backup files.
    pub suffix: String,
}

impl Default for BackupsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
        }
    }
}

/// Discover the .walkmod.toml config file in the project directory.
pub fn discover_config(project_dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a .walkmod.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<WalkmodConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<WalkmodConfig> {
    let config: WalkmodConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the project directory, or return default if not found.
pub fn load_or_default(project_dir: &Utf8Path) -> anyhow::Result<WalkmodConfig> {
    match discover_config(project_dir) {
        Some(path) => load_config(&path),
        None => Ok(WalkmodConfig::default()),
    }
}

/// Merged configuration combining config file and CLI arguments.
#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
    /// Explicit format; auto-detection applies when unset.
    pub format: Option<DocumentFormat>,

    pub recursive: bool,

    pub dry_run: bool,

    pub backups: BackupsConfig,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: WalkmodConfig,
}

impl ConfigMerger {
    /// Create a new merger from a loaded config.
    pub fn new(config: WalkmodConfig) -> Self {
        Self { config }
    }

    /// Merge with edit command CLI arguments.
    ///
    /// A CLI format replaces the configured one; boolean flags turn
    /// behaviour on when either side sets them.
    pub fn merge_edit_args(
        self,
        cli_format: Option<DocumentFormat>,
        cli_recursive: bool,
        cli_dry_run: bool,
        cli_backup: bool,
    ) -> MergedConfig {
        let mut backups = self.config.backups.clone();
        backups.enabled |= cli_backup;

        MergedConfig {
            format: cli_format.or(self.config.defaults.format),
            recursive: cli_recursive || self.config.defaults.recursive,
            dry_run: cli_dry_run || self.config.defaults.dry_run,
            backups,
        }
    }
}

/// Parse CLI params from key=value strings.
///
/// Values that read as JSON scalars (numbers, booleans) keep that type;
/// anything else is a string.
pub fn parse_cli_params(params: &[String]) -> anyhow::Result<Params> {
    let mut out = Params::new();
    for entry in params {
        let mut parts = entry.splitn(2, '=');
        let key = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("invalid param '{}': missing key", entry))?;
        let value = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("invalid param '{}': missing value", entry))?;
        out.insert(key.to_string(), parse_value(value));
    }
    Ok(out)
}

/// A JSON scalar when `raw` is one, a string otherwise.
pub fn parse_value(raw: &str) -> serde_json::Value {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(v) if v.is_boolean() || v.is_number() => v,
        _ => serde_json::Value::String(raw.to_string()),
    }
}
