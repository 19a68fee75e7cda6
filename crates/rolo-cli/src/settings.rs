//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`Settings::default()`]
//! 2. If `~/.rolo/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// OAuth/session settings passed to the session manager.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Client identifier issued by the identity provider.
    pub client_id: String,
    /// Provider host (or full origin) for login/logout/token endpoints.
    pub identity_domain: String,
    /// Redirect URI registered with the provider.
    pub redirect_uri: String,
    /// Base URL of the protected API.
    pub api_base_url: String,
}

/// Mock API server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiServerSettings {
    /// Host to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for ApiServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3001,
        }
    }
}

/// Top-level settings (`~/.rolo/settings.json`).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Session/OAuth settings.
    pub auth: AuthSettings,
    /// Mock API server settings.
    pub server: ApiServerSettings,
    /// tracing env-filter directive.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auth: AuthSettings {
                redirect_uri: "http://localhost:9876/callback".into(),
                api_base_url: "http://127.0.0.1:3001".into(),
                ..AuthSettings::default()
            },
            server: ApiServerSettings::default(),
            log_filter: "info".into(),
        }
    }
}

/// The data directory (`~/.rolo`).
pub fn data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".rolo")
}

/// Resolve the path to the settings file (`~/.rolo/settings.json`).
pub fn settings_path() -> PathBuf {
    data_dir().join("settings.json")
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> anyhow::Result<Settings> {
    let defaults = serde_json::to_value(Settings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: Settings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are silently ignored (fall back to file/default).
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Some(v) = read_env_string("ROLO_CLIENT_ID") {
        settings.auth.client_id = v;
    }
    if let Some(v) = read_env_string("ROLO_IDENTITY_DOMAIN") {
        settings.auth.identity_domain = v;
    }
    if let Some(v) = read_env_string("ROLO_REDIRECT_URI") {
        settings.auth.redirect_uri = v;
    }
    if let Some(v) = read_env_string("ROLO_API_BASE_URL") {
        settings.auth.api_base_url = v;
    }
    if let Some(v) = read_env_string("ROLO_API_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = std::env::var("ROLO_API_PORT")
        .ok()
        .and_then(|v| parse_u16_range(&v, 1, 65535))
    {
        settings.server.port = v;
    }
    if let Some(v) = read_env_string("ROLO_LOG") {
        settings.log_filter = v;
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

fn read_env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
