//! Application configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! are serialized to a TOML value and the user's file is merged on top of
//! them key by key, so a config file only needs the keys it changes.
//!
//! ## Config File Location
//!
//! ```text
//! ~/.config/image-sorter/      # dirs::config_dir() on Linux
//! └── config.toml
//! ```
//!
//! `--config-dir <dir>` points the binary somewhere else.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! projects_root = "~/ImageSorterProjects"
//!
//! [sorting]
//! min_crop_px = 10      # Smaller crops are treated as stray clicks
//! jpeg_quality = 95     # 1-100, JPEG output only
//!
//! [keys]
//! next = ["space", "n"] # Keys that skip to the next image
//!
//! [logging]
//! level = "info"        # off, error, warn, info, debug, trace
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Quality;
use crate::session::SortOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const CONFIG_FILENAME: &str = "config.toml";
const APP_DIR_NAME: &str = "image-sorter";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application configuration loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Directory holding one folder per project. A leading `~/` is expanded.
    pub projects_root: String,
    pub sorting: SortingConfig,
    pub keys: KeysConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            projects_root: "~/ImageSorterProjects".to_string(),
            sorting: SortingConfig::default(),
            keys: KeysConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.projects_root.trim().is_empty() {
            return Err(ConfigError::Validation(
                "projects_root must not be empty".into(),
            ));
        }
        if self.sorting.min_crop_px == 0 {
            return Err(ConfigError::Validation(
                "sorting.min_crop_px must be at least 1".into(),
            ));
        }
        if !(1..=100).contains(&self.sorting.jpeg_quality) {
            return Err(ConfigError::Validation(
                "sorting.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.keys.next.is_empty() {
            return Err(ConfigError::Validation("keys.next must not be empty".into()));
        }
        for key in &self.keys.next {
            if !is_valid_next_key(key) {
                return Err(ConfigError::Validation(format!(
                    "keys.next: {key:?} is not a single non-digit character or \"space\""
                )));
            }
        }
        self.logging.level_filter()?;
        Ok(())
    }

    /// `projects_root` with `~` expanded to the home directory.
    pub fn projects_root_path(&self) -> PathBuf {
        expand_home(&self.projects_root)
    }

    pub fn sort_options(&self) -> SortOptions {
        SortOptions {
            min_crop_px: self.sorting.min_crop_px,
            quality: Quality::new(self.sorting.jpeg_quality),
        }
    }
}

/// Commit settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SortingConfig {
    /// Crops narrower or shorter than this are ignored on commit.
    pub min_crop_px: u32,
    /// JPEG encoding quality (1-100).
    pub jpeg_quality: u32,
}

impl Default for SortingConfig {
    fn default() -> Self {
        Self {
            min_crop_px: crate::session::MIN_CROP_PX,
            jpeg_quality: 95,
        }
    }
}

/// Keyboard settings. Digits are always class hotkeys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeysConfig {
    /// Keys bound to "next image": `"space"` or a single character.
    pub next: Vec<String>,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            next: vec!["space".to_string(), "n".to_string()],
        }
    }
}

fn is_valid_next_key(key: &str) -> bool {
    if key.eq_ignore_ascii_case("space") {
        return true;
    }
    let mut chars = key.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if !c.is_ascii_digit() && !c.is_whitespace())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> Result<log::LevelFilter, ConfigError> {
        log::LevelFilter::from_str(&self.level).map_err(|_| {
            ConfigError::Validation(format!("logging.level: unknown level {:?}", self.level))
        })
    }
}

fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Default directory for `config.toml`.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME))
}

/// Stock defaults as a TOML value, the base layer for merging.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(AppConfig::default())?)
}

/// Lay the user's `config.toml` over the stock defaults.
///
/// Sections (`[sorting]`, `[keys]`, `[logging]`) merge key by key, so a
/// file that only sets `min_crop_px` keeps the stock `jpeg_quality`. Any
/// other value, including the `next` key list, replaces the stock one whole.
pub fn overlay_user_config(defaults: toml::Value, user: toml::Value) -> toml::Value {
    match (defaults, user) {
        (toml::Value::Table(mut table), toml::Value::Table(user_table)) => {
            for (key, user_val) in user_table {
                let value = match table.remove(&key) {
                    Some(stock) => overlay_user_config(stock, user_val),
                    None => user_val,
                };
                table.insert(key, value);
            }
            toml::Value::Table(table)
        }
        (_, user) => user,
    }
}

/// Parse `dir/config.toml`. A missing file is `Ok(None)`: the program runs
/// on stock defaults until the user writes one.
pub fn read_user_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let path = dir.join(CONFIG_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    log::debug!("reading {}", path.display());
    Ok(Some(toml::from_str(&content)?))
}

/// Stock defaults, with `user` on top when given, checked by
/// [`AppConfig::validate`].
pub fn resolve_config(user: Option<toml::Value>) -> Result<AppConfig, ConfigError> {
    let stock = stock_defaults_value()?;
    let merged = match user {
        Some(user) => overlay_user_config(stock, user),
        None => stock,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// The effective config for a given config directory.
pub fn load_config(dir: &Path) -> Result<AppConfig, ConfigError> {
    resolve_config(read_user_config(dir)?)
}

/// Load from `dir`, or from the default location, or fall back to defaults
/// when there is no config directory at all.
pub fn load_app_config(dir: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match dir.map(Path::to_path_buf).or_else(default_config_dir) {
        Some(dir) => load_config(&dir),
        None => Ok(AppConfig::default()),
    }
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Image Sorter Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# Directory holding one folder per project. "~/" expands to your home.
projects_root = "~/ImageSorterProjects"

# ---------------------------------------------------------------------------
# Sorting
# ---------------------------------------------------------------------------
[sorting]
# Crops smaller than this (in image pixels, either side) are ignored when
# an image is sent to a class. Catches accidental clicks.
min_crop_px = 10

# Quality for re-encoded JPEG files (1 = worst, 100 = best).
# PNG, BMP, TIFF and WebP output is lossless and ignores this.
jpeg_quality = 95

# ---------------------------------------------------------------------------
# Keys
# ---------------------------------------------------------------------------
[keys]
# Keys that skip to the next image without moving anything.
# "space" or any single non-digit character. Digits 0-9 are class hotkeys.
next = ["space", "n"]

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# off, error, warn, info, debug or trace. RUST_LOG overrides this.
level = "info"
"##
}
