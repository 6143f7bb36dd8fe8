use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::ollama::ClientConfig;

pub const CONFIG_ENV: &str = "OLLAMA_RUNNER_CONFIG";
pub const BASE_URL_ENV: &str = "OLLAMA_RUNNER_BASE_URL";
pub const MODEL_ENV: &str = "OLLAMA_RUNNER_MODEL";
pub const EMBED_MODEL_ENV: &str = "OLLAMA_RUNNER_EMBED_MODEL";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub embed_model: Option<String>,
    /// Seconds.
    pub generate_timeout: Option<u64>,
    pub embeddings_timeout: Option<u64>,
    pub chat_timeout: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    profiles: Option<HashMap<String, ProfileConfig>>,
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub profile: Option<String>,
}

/// Fully resolved settings for one CLI invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub client: ClientConfig,
    pub model: Option<String>,
    pub embed_model: Option<String>,
}

impl Settings {
    pub fn require_model(&self) -> Result<&str, String> {
        self.model
            .as_deref()
            .ok_or_else(|| format!("No model provided. Use --model or set {MODEL_ENV}."))
    }

    pub fn require_embed_model(&self) -> Result<&str, String> {
        self.embed_model.as_deref().ok_or_else(|| {
            format!("No embedding model provided. Use --model or set {EMBED_MODEL_ENV}.")
        })
    }
}

/// Resolves settings with precedence: CLI flag, environment, profile, default.
pub fn resolve(overrides: &Overrides) -> Result<Settings, String> {
    let profile = match overrides.profile.as_deref() {
        Some(name) => {
            let profile = load_profile(name)?;
            check_timeouts(name, &profile)?;
            profile
        }
        None => ProfileConfig::default(),
    };

    let mut client = ClientConfig::default();
    if let Some(base_url) = overrides
        .base_url
        .clone()
        .or_else(|| env_value(BASE_URL_ENV))
        .or(profile.base_url)
    {
        check_base_url(&base_url)?;
        client.base_url = base_url;
    }
    if let Some(secs) = profile.generate_timeout {
        client.generate_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = profile.embeddings_timeout {
        client.embeddings_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = profile.chat_timeout {
        client.chat_timeout = Duration::from_secs(secs);
    }

    let model = overrides
        .model
        .clone()
        .or_else(|| env_value(MODEL_ENV))
        .or(profile.model);
    let embed_model = overrides
        .model
        .clone()
        .or_else(|| env_value(EMBED_MODEL_ENV))
        .or(profile.embed_model);

    Ok(Settings {
        client,
        model,
        embed_model,
    })
}

pub fn load_profile(name: &str) -> Result<ProfileConfig, String> {
    let path = config_path()?;
    let profiles = read_profiles(&path)?;

    profiles.get(name).cloned().ok_or_else(|| {
        format!(
            "Profile '{}' not found in config file '{}'.",
            name,
            path.display()
        )
    })
}

/// Parses the config file and checks every profile, or only `profile` when
/// one is named. Returns the path that was checked.
pub fn validate_config(profile: Option<&str>) -> Result<PathBuf, String> {
    let path = config_path()?;
    let profiles = read_profiles(&path)?;

    let selected: Vec<(&String, &ProfileConfig)> = match profile {
        Some(name) => {
            let (key, config) = profiles.get_key_value(name).ok_or_else(|| {
                format!(
                    "Profile '{}' not found in config file '{}'.",
                    name,
                    path.display()
                )
            })?;
            vec![(key, config)]
        }
        None => profiles.iter().collect(),
    };

    for (name, config) in selected {
        if let Some(base_url) = &config.base_url {
            check_base_url(base_url).map_err(|err| format!("Profile '{name}': {err}"))?;
        }
        check_timeouts(name, config)?;
    }

    Ok(path)
}

fn read_profiles(path: &Path) -> Result<HashMap<String, ProfileConfig>, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read config file '{}': {err}", path.display()))?;

    let config: ConfigFile = toml::from_str(&raw)
        .map_err(|err| format!("Failed to parse config file '{}': {err}", path.display()))?;

    config.profiles.ok_or_else(|| {
        format!(
            "Config file '{}' does not contain a [profiles] section.",
            path.display()
        )
    })
}

fn check_timeouts(name: &str, config: &ProfileConfig) -> Result<(), String> {
    for (field, value) in [
        ("generate_timeout", config.generate_timeout),
        ("embeddings_timeout", config.embeddings_timeout),
        ("chat_timeout", config.chat_timeout),
    ] {
        if value == Some(0) {
            return Err(format!("Profile '{name}': {field} must be greater than 0."));
        }
    }
    Ok(())
}

fn check_base_url(base_url: &str) -> Result<(), String> {
    let trimmed = base_url.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(())
    } else {
        Err(format!(
            "Invalid base URL '{base_url}'. Expected an http:// or https:// address."
        ))
    }
}

fn env_value(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn config_path() -> Result<PathBuf, String> {
    if let Some(path) = env_value(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    if let Some(xdg) = env_value("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("ollama-runner").join("config.toml"));
    }

    let home = env::var("HOME").map_err(|_| {
        format!("Cannot resolve config path: set {CONFIG_ENV} or HOME/XDG_CONFIG_HOME.")
    })?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("ollama-runner")
        .join("config.toml"))
}
