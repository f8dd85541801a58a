use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Environment variable that overrides the config.json lookup.
pub const CONFIG_ENV: &str = "TODO_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP port to listen on.
    pub port: u16,

    /// Log level for tracing (e.g. "info", "debug").
    pub log_level: String,

    pub server_version: String,

    /// Credentials required by DELETE /todos/{id}.
    pub admin_user: String,
    pub admin_password: String,

    /// Reject PUT bodies whose `id` differs from the URL id, and PUT bodies
    /// with an empty `text`. Off by default: both are tolerated.
    pub strict_updates: bool,

    /// Outbound queue size per WebSocket session. A session whose queue
    /// fills up is dropped by the hub.
    pub ws_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            log_level: "info".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            admin_user: "admin".to_string(),
            admin_password: "admin".to_string(),
            strict_updates: false,
            ws_buffer: 64,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        serde_json::from_str::<AppConfig>(&file).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load config.json from `TODO_CONFIG`, the executable folder or its
    /// parent, falling back to defaults when none exists.
    ///
    /// Returns the path that was used, if any, so the caller can log it once
    /// tracing is up.
    pub fn load() -> Result<(Self, Option<PathBuf>), ConfigError> {
        match locate() {
            Some(path) => Ok((Self::load_from_file(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }
}

fn locate() -> Option<PathBuf> {
    if let Ok(explicit) = env::var(CONFIG_ENV) {
        return Some(PathBuf::from(explicit));
    }

    let exe_path = env::current_exe().ok()?;
    let exe_dir = exe_path.parent()?;

    [exe_dir.join("config.json"), exe_dir.join("..").join("config.json")]
        .into_iter()
        .find(|candidate| candidate.exists())
}
