//! Configuration management
//!
//! Two layers live here: the on-disk `Config` (LLM provider plus a map of
//! runtime settings), and the per-invocation resolution of the Elfa
//! base URL and API key from those settings or the process environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::Result;

/// Setting key for the Elfa API base URL.
pub const BASE_URL_KEY: &str = "ELFA_AI_BASE_URL";

/// Setting key for the Elfa API key.
pub const API_KEY_KEY: &str = "ELFA_AI_API_KEY";

/// Key/value lookup for runtime settings.
pub trait Settings: Send + Sync {
    fn get_setting(&self, key: &str) -> Option<String>;
}

impl Settings for HashMap<String, String> {
    fn get_setting(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Reads settings from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Settings for ProcessEnv {
    fn get_setting(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Resolved connection settings for the Elfa API.
#[derive(Clone, PartialEq, Eq)]
pub struct ElfaConfig {
    pub base_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for ElfaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElfaConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .finish()
    }
}

/// Resolve the Elfa configuration.
///
/// Runtime settings win over the environment. Blank values count as
/// missing, and the error names every key that could not be resolved.
pub fn resolve(settings: &dyn Settings, env: &dyn Settings) -> Result<ElfaConfig> {
    let lookup = |key: &str| {
        settings
            .get_setting(key)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| env.get_setting(key).filter(|v| !v.trim().is_empty()))
    };

    let base_url = lookup(BASE_URL_KEY);
    let api_key = lookup(API_KEY_KEY);

    match (base_url, api_key) {
        (Some(base_url), Some(api_key)) => Ok(ElfaConfig { base_url, api_key }),
        (base_url, api_key) => {
            let mut missing = Vec::with_capacity(2);
            if base_url.is_none() {
                missing.push(BASE_URL_KEY.to_string());
            }
            if api_key.is_none() {
                missing.push(API_KEY_KEY.to_string());
            }
            Err(Error::Configuration { missing })
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// LLM provider to use
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Gemini API key (used when provider is "gemini")
    #[serde(default)]
    pub gemini_api_key: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Conversation messages shown to the extractor
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Runtime settings (ELFA_AI_BASE_URL, ELFA_AI_API_KEY, ...)
    #[serde(default)]
    pub settings: HashMap<String, String>,
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_history_window() -> usize {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            gemini_api_key: String::new(),
            model: default_model(),
            history_window: default_history_window(),
            settings: HashMap::new(),
        }
    }
}

impl Settings for Config {
    fn get_setting(&self, key: &str) -> Option<String> {
        self.settings.get_setting(key)
    }
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".elfa")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load configuration from the default location.
///
/// A missing file yields the defaults so the environment alone can drive
/// the actions.
pub fn load() -> Result<Config> {
    let path = config_path();
    if !path.exists() {
        return Ok(Config::default());
    }
    load_from(&path)
}

/// Load configuration from a specific file
pub fn load_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}

/// Save configuration to the default location
pub fn save(config: &Config) -> Result<()> {
    save_to(config, &config_path())
}

/// Save configuration to a specific file
pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Interactive setup wizard
pub fn onboard() -> Result<()> {
    use crate::ui;
    use inquire::{Password, PasswordDisplayMode, Text};

    ui::print_header("Setup Wizard");
    println!("  I'll record your Elfa and Gemini credentials.\n");

    let mut config = load()?;
    let prompt_err = |e: inquire::InquireError| Error::Config(format!("Prompt failed: {}", e));

    let base_url = Text::new("Elfa API base URL:")
        .with_default(
            config
                .settings
                .get(BASE_URL_KEY)
                .map(String::as_str)
                .unwrap_or("https://api.elfa.ai"),
        )
        .prompt()
        .map_err(prompt_err)?;

    let api_key = Password::new("Elfa API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .map_err(prompt_err)?;

    let gemini_key = Password::new("Gemini API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .map_err(prompt_err)?;

    if api_key.trim().is_empty() {
        return Err(Error::Config("Elfa API key cannot be empty".to_string()));
    }

    config.settings.insert(BASE_URL_KEY.to_string(), base_url.trim().to_string());
    config.settings.insert(API_KEY_KEY.to_string(), api_key.trim().to_string());
    if !gemini_key.trim().is_empty() {
        config.gemini_api_key = gemini_key.trim().to_string();
    }

    ui::print_thinking("Saving configuration");
    save(&config)?;
    ui::print_success(&format!("Saved to {:?}", config_path()));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.history_window, 20);
    }

    #[test]
    fn test_resolve_prefers_settings() {
        let settings = map(&[(BASE_URL_KEY, "https://settings"), (API_KEY_KEY, "k1")]);
        let env = map(&[(BASE_URL_KEY, "https://env"), (API_KEY_KEY, "k2")]);

        let cfg = resolve(&settings, &env).unwrap();
        assert_eq!(cfg.base_url, "https://settings");
        assert_eq!(cfg.api_key, "k1");
    }

    #[test]
    fn test_resolve_falls_back_to_env() {
        let settings = map(&[(BASE_URL_KEY, "   ")]);
        let env = map(&[(BASE_URL_KEY, "https://env"), (API_KEY_KEY, "k2")]);

        let cfg = resolve(&settings, &env).unwrap();
        assert_eq!(cfg.base_url, "https://env");
        assert_eq!(cfg.api_key, "k2");
    }

    #[test]
    fn test_resolve_lists_all_missing() {
        let settings = map(&[(API_KEY_KEY, "")]);
        let env: HashMap<String, String> = HashMap::new();

        match resolve(&settings, &env) {
            Err(Error::Configuration { missing }) => {
                assert_eq!(missing, vec![BASE_URL_KEY, API_KEY_KEY]);
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_masks_key() {
        let cfg = ElfaConfig {
            base_url: "https://api.elfa.ai".into(),
            api_key: "secret".into(),
        };
        assert!(!format!("{:?}", cfg).contains("secret"));
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.settings.insert(API_KEY_KEY.into(), "abc".into());
        save_to(&config, &path).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.get_setting(API_KEY_KEY).as_deref(), Some("abc"));
        assert_eq!(loaded.model, config.model);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = serde_json::from_str(r#"{"model": "gemini-1.5-pro"}"#).unwrap();
        assert_eq!(parsed.model, "gemini-1.5-pro");
        assert_eq!(parsed.provider, "gemini");
        assert!(parsed.settings.is_empty());
    }
}
