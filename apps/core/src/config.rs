use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::autocomplete::MatchAnchor;

const APP_DIR_NAME: &str = "tasklens";
const CONFIG_FILE_NAME: &str = "config.toml";
const SNAPSHOT_FILE_NAME: &str = "snapshot.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("invalid value for {key}: '{value}'")]
    InvalidEnv { key: &'static str, value: String },
    #[error("{0}")]
    Invalid(String),
}

/// How task links open: in the desktop app or the web app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOpen {
    App,
    #[default]
    Browser,
}

impl TaskOpen {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "app" => Some(Self::App),
            "browser" => Some(Self::Browser),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub snapshot_path: PathBuf,
    #[serde(skip)]
    pub config_path: PathBuf,
    pub match_anchor: MatchAnchor,
    pub refresh_days: u32,
    pub max_results: u16,
    pub task_open: TaskOpen,
    pub default_project: String,
}

impl Default for Config {
    fn default() -> Self {
        let base = stable_app_data_dir();
        Self {
            snapshot_path: base.join(SNAPSHOT_FILE_NAME),
            config_path: base.join(CONFIG_FILE_NAME),
            data_dir: base,
            match_anchor: MatchAnchor::Anywhere,
            refresh_days: 1,
            max_results: 200,
            task_open: TaskOpen::Browser,
            default_project: "Inbox".to_string(),
        }
    }
}

pub fn stable_app_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("XDG_DATA_HOME").filter(|dir| !dir.is_empty()) {
        return PathBuf::from(dir).join(APP_DIR_NAME);
    }
    if let Some(home) = std::env::var_os("HOME").filter(|home| !home.is_empty()) {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR_NAME);
    }
    std::env::temp_dir().join(APP_DIR_NAME)
}

/// Loads the config file (defaults when absent), then applies env overrides.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| stable_app_data_dir().join(CONFIG_FILE_NAME));

    let mut config = read_file(&config_path)?;
    config.config_path = config_path;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config).map_err(ConfigError::Invalid)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<Config, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Config::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };
    let mut config: Config = if path.extension().and_then(|ext| ext.to_str()) == Some("json5") {
        json5::from_str(&raw).map_err(|error| parse_error(error.to_string()))?
    } else {
        toml::from_str(&raw).map_err(|error| parse_error(error.to_string()))?
    };

    // A data_dir set without an explicit snapshot path moves the snapshot with it.
    if config.snapshot_path == Config::default().snapshot_path {
        config.snapshot_path = config.data_dir.join(SNAPSHOT_FILE_NAME);
    }
    Ok(config)
}

/// Applies `TASKLENS_*` overrides read through `lookup`.
pub fn apply_env_overrides(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(dir) = read("TASKLENS_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
        config.snapshot_path = config.data_dir.join(SNAPSHOT_FILE_NAME);
    }
    if let Some(path) = read("TASKLENS_SNAPSHOT") {
        config.snapshot_path = PathBuf::from(path);
    }
    if let Some(value) = read("TASKLENS_PARTIAL_MATCH") {
        config.match_anchor = MatchAnchor::parse(&value).ok_or(ConfigError::InvalidEnv {
            key: "TASKLENS_PARTIAL_MATCH",
            value,
        })?;
    }
    if let Some(value) = read("TASKLENS_REFRESH_DAYS") {
        config.refresh_days = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            key: "TASKLENS_REFRESH_DAYS",
            value,
        })?;
    }
    if let Some(value) = read("TASKLENS_TASK_OPEN") {
        config.task_open = TaskOpen::parse(&value).ok_or(ConfigError::InvalidEnv {
            key: "TASKLENS_TASK_OPEN",
            value,
        })?;
    }
    Ok(())
}

pub fn validate(cfg: &Config) -> Result<(), String> {
    if cfg.max_results < 5 || cfg.max_results > 500 {
        return Err("max_results out of range".into());
    }

    if cfg.refresh_days > 365 {
        return Err("refresh_days out of range".into());
    }

    if cfg.snapshot_path.as_os_str().is_empty() {
        return Err("snapshot_path is required".into());
    }

    if cfg.data_dir.as_os_str().is_empty() {
        return Err("data_dir is required".into());
    }

    if cfg.default_project.trim().is_empty() {
        return Err("default_project is required".into());
    }

    Ok(())
}
