// Configuration loading and parsing (config/backfield.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::sleeper::DEFAULT_API_BASE_URL;

/// Environment variable that overrides `sleeper.api_base_url`.
pub const API_BASE_URL_ENV: &str = "BACKFIELD_API_BASE_URL";

const CONFIG_FILE: &str = "backfield.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// backfield.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub sleeper: SleeperConfig,
    pub players: PlayersConfig,
    #[serde(default)]
    pub trending: TrendingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SleeperConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_sport")]
    pub sport: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_sport() -> String {
    "nfl".to_string()
}

/// Where and for how long the static player directory is cached.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayersConfig {
    /// SQLite file for the player directory. When omitted, the platform data
    /// directory is used (see [`PlayersConfig::resolved_cache_path`]).
    #[serde(default)]
    pub cache_path: Option<String>,
    pub max_age_hours: u32,
}

impl PlayersConfig {
    pub fn resolved_cache_path(&self) -> PathBuf {
        if let Some(path) = self.cache_path.as_deref().filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        match directories::ProjectDirs::from("", "", "backfield") {
            Some(dirs) => dirs.data_dir().join("players.db"),
            None => PathBuf::from("players.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendingConfig {
    pub lookback_hours: u32,
    pub limit: u32,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            lookback_hours: 24,
            limit: 25,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/backfield.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let mut config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    if let Ok(url) = std::env::var(API_BASE_URL_ENV) {
        if !url.trim().is_empty() {
            config.sleeper.api_base_url = url;
        }
    }

    validate(&config)?;

    Ok(config)
}

/// Seed `config/backfield.toml` from `defaults/backfield.toml` when the
/// user has none yet. Returns the path written, or `None` if a config was
/// already present. An existing config is never overwritten.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    let content = std::fs::read(&source).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!(
            "no config/{CONFIG_FILE} and cannot read {}: {e}",
            source.display()
        ),
    })?;

    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", dir.display()),
        })?;
    }

    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(dest) => dest,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(None),
        Err(e) => {
            return Err(ConfigError::DefaultsCopyError {
                message: format!("failed to create {}: {e}", target.display()),
            })
        }
    };
    std::io::Write::write_all(&mut dest, &content).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to write {}: {e}", target.display()),
    })?;

    Ok(Some(target))
}

/// Loads config relative to `base_dir`, copying defaults in first.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_file(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let url = config.sleeper.api_base_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError {
            field: "sleeper.api_base_url".into(),
            message: format!("must be an http(s) URL, got {url:?}"),
        });
    }

    if config.sleeper.sport.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "sleeper.sport".into(),
            message: "must not be empty".into(),
        });
    }

    let positive: &[(&str, u32)] = &[
        ("players.max_age_hours", config.players.max_age_hours),
        ("trending.lookback_hours", config.trending.lookback_hours),
        ("trending.limit", config.trending.limit),
    ];
    for (name, val) in positive {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
