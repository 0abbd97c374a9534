use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use coach_core::{
    gemini::{generate_content_url, GeminiSetupError, DEFAULT_BASE_URL, DEFAULT_MODEL},
    GeminiConfig, SessionConfig,
};
use serde::Deserialize;
use shared::domain::GreetingSource;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "coach.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read config file '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("no API key configured; set GEMINI_API_KEY or api_key in coach.toml")]
    MissingApiKey,
    #[error("invalid api_base_url setting: {0}")]
    Endpoint(#[source] GeminiSetupError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub start_greeting: GreetingSource,
    pub restart_greeting: GreetingSource,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.into(),
            api_base_url: DEFAULT_BASE_URL.into(),
            request_timeout_secs: 60,
            start_greeting: GreetingSource::External,
            restart_greeting: GreetingSource::Canned,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_key: Option<String>,
    model: Option<String>,
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    start_greeting: Option<GreetingSource>,
    restart_greeting: Option<GreetingSource>,
}

impl Settings {
    pub fn gemini_config(&self) -> Result<GeminiConfig, SettingsError> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(SettingsError::MissingApiKey)?;
        generate_content_url(&self.api_base_url, &self.model, api_key)
            .map_err(SettingsError::Endpoint)?;

        Ok(GeminiConfig {
            api_key: api_key.to_string(),
            model: self.model.clone(),
            base_url: self.api_base_url.clone(),
            request_timeout: self.request_timeout(),
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            start_greeting: self.start_greeting,
            restart_greeting: self.restart_greeting,
            reply_timeout: Some(self.request_timeout()),
            ..SessionConfig::default()
        }
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Defaults, then the config file, then environment overrides.
///
/// An explicitly named file must exist; the default `coach.toml` is optional.
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &path, &raw)?,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {}
        Err(source) => return Err(SettingsError::Read { path, source }),
    }

    apply_env(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, path: &Path, raw: &str) -> Result<(), SettingsError> {
    let file_cfg: FileSettings = toml::from_str(raw).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(v) = file_cfg.api_key {
        settings.api_key = Some(v);
    }
    if let Some(v) = file_cfg.model {
        settings.model = v;
    }
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.start_greeting {
        settings.start_greeting = v;
    }
    if let Some(v) = file_cfg.restart_greeting {
        settings.restart_greeting = v;
    }

    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("GEMINI_API_KEY") {
        settings.api_key = Some(v);
    }
    if let Some(v) = lookup("APP__API_KEY") {
        settings.api_key = Some(v);
    }

    if let Some(v) = lookup("APP__MODEL") {
        settings.model = v;
    }

    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = parsed,
            Err(_) => warn!(value = %v, "ignoring invalid APP__REQUEST_TIMEOUT_SECS"),
        }
    }

    if let Some(v) = lookup("APP__START_GREETING") {
        match v.parse::<GreetingSource>() {
            Ok(parsed) => settings.start_greeting = parsed,
            Err(err) => warn!(error = %err, "ignoring invalid APP__START_GREETING"),
        }
    }
    if let Some(v) = lookup("APP__RESTART_GREETING") {
        match v.parse::<GreetingSource>() {
            Ok(parsed) => settings.restart_greeting = parsed,
            Err(err) => warn!(error = %err, "ignoring invalid APP__RESTART_GREETING"),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
