//! # Configuration
//!
//! Centralizes startup settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.jotter/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.
//!
//! Runtime-adjustable settings (theme, navigator) are persisted separately
//! in `preferences.json`; the values here only seed them.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::preferences::Preferences;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct JotterConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub theme: Option<String>,
    pub show_top_level_navigator: Option<bool>,
    pub show_feature_checklist: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    pub notes_dir: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_THEME: &str = "dark";
pub const DEFAULT_SHOW_TOP_LEVEL_NAVIGATOR: bool = true;
pub const DEFAULT_SHOW_FEATURE_CHECKLIST: bool = true;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Seed values for the preferences store.
    pub preferences: Preferences,
    /// Theme forced for this run (CLI or env); not written back.
    pub theme_override: Option<String>,
    pub show_feature_checklist: bool,
    pub notes_dir: PathBuf,
    /// `None` keeps preferences in memory only.
    pub preferences_path: Option<PathBuf>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.jotter`.
pub fn jotter_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".jotter"))
}

/// Returns the path to `~/.jotter/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    jotter_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.jotter/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `JotterConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<JotterConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(JotterConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<JotterConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(JotterConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: JotterConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Jotter Configuration
# All settings are optional. Defaults cover anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.
# Theme and navigator changes made in the preferences panel (Ctrl+,) are
# saved to preferences.json and take precedence over this file.

# [general]
# theme = "dark"                     # "dark", "light", "sepia", "solarizedDark", "legacy"
# show_top_level_navigator = true
# show_feature_checklist = true      # shortcut cheat sheet on startup

# [storage]
# notes_dir = "~/.jotter/notes"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// CLI flags that take part in resolution (None = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub theme: Option<String>,
    pub notes_dir: Option<PathBuf>,
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &JotterConfig, cli: &CliOverrides) -> ResolvedConfig {
    let base = jotter_dir();

    // Theme override: CLI → env. The config value only seeds preferences.
    let theme_override = cli
        .theme
        .clone()
        .or_else(|| std::env::var("JOTTER_THEME").ok());

    // Notes dir: CLI → env → config → default
    let notes_dir = cli
        .notes_dir
        .clone()
        .or_else(|| std::env::var("JOTTER_NOTES_DIR").ok().map(PathBuf::from))
        .or_else(|| config.storage.notes_dir.as_deref().map(expand_home))
        .or_else(|| base.as_ref().map(|b| b.join("notes")))
        .unwrap_or_else(|| PathBuf::from("notes"));

    let preferences = Preferences {
        theme: config
            .general
            .theme
            .clone()
            .unwrap_or_else(|| DEFAULT_THEME.to_string()),
        show_top_level_navigator: config
            .general
            .show_top_level_navigator
            .unwrap_or(DEFAULT_SHOW_TOP_LEVEL_NAVIGATOR),
    };

    ResolvedConfig {
        preferences,
        theme_override,
        show_feature_checklist: config
            .general
            .show_feature_checklist
            .unwrap_or(DEFAULT_SHOW_FEATURE_CHECKLIST),
        notes_dir,
        preferences_path: base.map(|b| b.join("preferences.json")),
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
