//! Application configuration for the podfic importer.
//!
//! User config lives at `~/.podfic-import/podfic-import.toml`.
//! CLI flags override config file values, which override defaults.
//! Templates and import options live in the key-value store ([`crate::store`]),
//! not here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PodficError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "podfic-import.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".podfic-import";

/// Default key-value store file name inside the config directory.
const STORE_FILE_NAME: &str = "store.json";

// ---------------------------------------------------------------------------
// Config structs (matching podfic-import.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Logged-in session used for credentialed fetches.
    #[serde(default)]
    pub session: SessionConfig,

    /// Key-value store location.
    #[serde(default)]
    pub store: StoreConfig,
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header; defaults to the crate name and version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Whole-request timeout. Unset means the transport default (none).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Maximum redirects followed per fetch.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: None,
            max_redirects: default_max_redirects(),
        }
    }
}

fn default_max_redirects() -> usize {
    5
}

/// `[session]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the env var holding the session cookie (never store the cookie itself).
    #[serde(default = "default_cookie_env")]
    pub cookie_env: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_env: default_cookie_env(),
        }
    }
}

fn default_cookie_env() -> String {
    "AO3_SESSION_COOKIE".into()
}

/// `[store]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store file; defaults to `store.json` in the config directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.podfic-import/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| PodficError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.podfic-import/podfic-import.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve the key-value store file for a config.
pub fn store_path(config: &AppConfig) -> Result<PathBuf> {
    match &config.store.path {
        Some(p) => Ok(PathBuf::from(p)),
        None => Ok(config_dir()?.join(STORE_FILE_NAME)),
    }
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PodficError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PodficError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PodficError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| PodficError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PodficError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the session cookie from the configured env var.
///
/// `None` when the variable is unset or empty; credentialed fetches then go out
/// without a session and are treated by the archive as anonymous.
pub fn session_cookie(config: &AppConfig) -> Option<String> {
    match std::env::var(&config.session.cookie_env) {
        Ok(val) if !val.trim().is_empty() => Some(val.trim().to_string()),
        _ => {
            tracing::debug!(
                var = %config.session.cookie_env,
                "no session cookie configured"
            );
            None
        }
    }
}
