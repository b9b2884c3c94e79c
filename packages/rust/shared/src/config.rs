//! Application configuration for gradesync.
//!
//! Non-secret settings live at `~/.gradesync/gradesync.toml`. Credentials
//! come only from the environment and are read once at the process entry
//! point, then passed into collaborators as explicit values.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::error::{GradesyncError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "gradesync.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".gradesync";

/// Materialized Google OAuth token file name.
const TOKEN_FILE_NAME: &str = "token.json";

/// Required: Gradescope account email.
pub const ENV_EMAIL: &str = "GRADESCOPE_EMAIL";
/// Required: Gradescope account password.
pub const ENV_PASSWORD: &str = "GRADESCOPE_PASSWORD";
/// Optional: target calendar name override.
pub const ENV_CALENDAR_NAME: &str = "GOOGLE_CALENDAR_NAME";
/// Optional: base64-encoded `token.json` contents for non-interactive runs.
pub const ENV_GOOGLE_TOKEN: &str = "GOOGLE_TOKEN";

// ---------------------------------------------------------------------------
// Config structs (matching gradesync.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gradescope endpoint settings.
    #[serde(default)]
    pub gradescope: GradescopeConfig,

    /// Target calendar settings.
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Output settings for ICS generation.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[gradescope]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradescopeConfig {
    /// Base URL of the Gradescope instance.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for GradescopeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.gradescope.com".into()
}

/// `[calendar]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Name of the Google calendar to sync into. Falls back to the primary
    /// calendar when no calendar with this name exists.
    #[serde(default = "default_calendar_name")]
    pub name: String,

    /// IANA zone label attached to emitted events. Passed through as an
    /// opaque string; gradesync never consults a timezone database.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            name: default_calendar_name(),
            timezone: default_timezone(),
        }
    }
}

fn default_calendar_name() -> String {
    "Berkeley Calendar".into()
}
fn default_timezone() -> String {
    "America/Los_Angeles".into()
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path of the generated `.ics` file, relative to the working directory.
    #[serde(default = "default_ics_path")]
    pub ics_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            ics_path: default_ics_path(),
        }
    }
}

fn default_ics_path() -> String {
    "docs/gradescope.ics".into()
}

// ---------------------------------------------------------------------------
// Credentials (environment only, never stored in the config file)
// ---------------------------------------------------------------------------

/// Gradescope login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Read credentials from `GRADESCOPE_EMAIL` / `GRADESCOPE_PASSWORD`.
    /// Missing either is a fatal configuration error.
    pub fn from_env() -> Result<Self> {
        let email = require_env(ENV_EMAIL)?;
        let password = require_env(ENV_PASSWORD)?;
        Ok(Self { email, password })
    }
}

fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(GradesyncError::config(format!(
            "{name} is not set. Set {ENV_EMAIL} and {ENV_PASSWORD} environment variables."
        ))),
    }
}

/// Resolve the target calendar name: `GOOGLE_CALENDAR_NAME` when set,
/// otherwise the configured (or default) name.
pub fn resolve_calendar_name(config: &AppConfig) -> String {
    match std::env::var(ENV_CALENDAR_NAME) {
        Ok(name) if !name.is_empty() => name,
        _ => config.calendar.name.clone(),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.gradesync/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| GradesyncError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.gradesync/gradesync.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
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
    let content = std::fs::read_to_string(path).map_err(|e| GradesyncError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| GradesyncError::config(format!("failed to parse {}: {e}", path.display())))
}

// ---------------------------------------------------------------------------
// Google token materialization
// ---------------------------------------------------------------------------

/// Decode a base64-encoded `token.json` payload.
pub fn decode_google_token(encoded: &str) -> Result<String> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| GradesyncError::config(format!("invalid {ENV_GOOGLE_TOKEN}: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| GradesyncError::config(format!("{ENV_GOOGLE_TOKEN} is not UTF-8: {e}")))
}

/// Resolve the Google token file, writing it from the `GOOGLE_TOKEN`
/// environment variable when present (non-interactive environments).
///
/// Returns the path to `token.json`. Having neither the variable nor an
/// existing file is a fatal precondition failure.
pub fn materialize_google_token() -> Result<PathBuf> {
    let dir = config_dir()?;
    let path = dir.join(TOKEN_FILE_NAME);

    if let Ok(encoded) = std::env::var(ENV_GOOGLE_TOKEN) {
        if !encoded.is_empty() {
            let decoded = decode_google_token(&encoded)?;
            std::fs::create_dir_all(&dir).map_err(|e| GradesyncError::io(&dir, e))?;
            std::fs::write(&path, decoded).map_err(|e| GradesyncError::io(&path, e))?;
            tracing::info!(?path, "Google credentials loaded from environment variable");
            return Ok(path);
        }
    }

    if path.exists() {
        tracing::debug!(?path, "using existing token file");
        return Ok(path);
    }

    Err(GradesyncError::config(format!(
        "no Google credentials found. Set {ENV_GOOGLE_TOKEN} or place {TOKEN_FILE_NAME} in {}",
        dir.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("www.gradescope.com"));
        assert!(toml_str.contains("Berkeley Calendar"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.calendar.timezone, "America/Los_Angeles");
        assert_eq!(parsed.output.ics_path, "docs/gradescope.ics");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[calendar]
name = "School Deadlines"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.calendar.name, "School Deadlines");
        assert_eq!(config.calendar.timezone, "America/Los_Angeles");
        assert_eq!(config.gradescope.base_url, "https://www.gradescope.com");
    }

    #[test]
    fn google_token_decodes() {
        let decoded = decode_google_token("eyJ0b2tlbiI6ICJhYmMifQ==").expect("decode");
        assert_eq!(decoded, r#"{"token": "abc"}"#);

        let err = decode_google_token("not base64!!").unwrap_err();
        assert!(err.to_string().contains("GOOGLE_TOKEN"));
    }
}
