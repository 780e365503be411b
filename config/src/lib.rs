//! Configuration for Orion.
//!
//! Reads `~/.orion/config.toml`. Every section and key is optional; the
//! accessor methods fold missing values into defaults so callers never deal
//! with `Option` chains. Secrets never live here: see [`credentials`].

pub mod credentials;

pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StoreError};

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use orion_types::PersonaId;
use orion_types::ui::Theme;

/// Default prefix length handed to the speech sink.
pub const DEFAULT_SPEECH_MAX_CHARS: usize = 150;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_INITIAL_DELAY_MS: u64 = 500;
const DEFAULT_MAX_DELAY_MS: u64 = 8_000;
const DEFAULT_JITTER_FACTOR: f64 = 0.25;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Default, Deserialize)]
pub struct OrionConfig {
    pub app: Option<AppConfig>,
    pub gemini: Option<GeminiConfig>,
    pub github: Option<GitHubConfig>,
    pub retry: Option<RetrySettings>,
    pub voice: Option<VoiceConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Initial persona id or role alias (`bolt`, `legal`, ...).
    pub persona: Option<String>,
    /// `dark` or `light`.
    pub theme: Option<String>,
    /// Speak assistant replies on startup.
    #[serde(default)]
    pub voice: bool,
    /// Prefix length passed to the speech sink.
    pub speech_max_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeminiConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GitHubConfig {
    pub base_url: Option<String>,
}

/// Raw retry knobs. Resolved into the provider's policy by the engine.
#[derive(Debug, Default, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: Option<u32>,
    pub initial_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub jitter_factor: Option<f64>,
    /// Per-attempt deadline. `0` disables it.
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VoiceConfig {
    /// Text-to-speech program; the reply excerpt is passed as its last argument.
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

impl OrionConfig {
    /// Load the user config. `Ok(None)` when there is no home directory or no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    #[must_use]
    pub fn initial_persona(&self) -> PersonaId {
        let Some(raw) = self.app.as_ref().and_then(|app| app.persona.as_deref()) else {
            return PersonaId::default();
        };
        PersonaId::parse(raw).unwrap_or_else(|e| {
            tracing::warn!("{e}; falling back to {}", PersonaId::default());
            PersonaId::default()
        })
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        let Some(raw) = self.app.as_ref().and_then(|app| app.theme.as_deref()) else {
            return Theme::default();
        };
        Theme::parse(raw).unwrap_or_else(|| {
            tracing::warn!("Unknown theme in config: {}", raw);
            Theme::default()
        })
    }

    #[must_use]
    pub fn voice_enabled(&self) -> bool {
        self.app.as_ref().is_some_and(|app| app.voice)
    }

    #[must_use]
    pub fn speech_max_chars(&self) -> usize {
        self.app
            .as_ref()
            .and_then(|app| app.speech_max_chars)
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_SPEECH_MAX_CHARS)
    }

    #[must_use]
    pub fn gemini_base_url(&self) -> Option<&str> {
        self.gemini.as_ref().and_then(|g| non_blank(g.base_url.as_deref()))
    }

    #[must_use]
    pub fn gemini_model(&self) -> Option<&str> {
        self.gemini.as_ref().and_then(|g| non_blank(g.model.as_deref()))
    }

    #[must_use]
    pub fn github_base_url(&self) -> Option<&str> {
        self.github.as_ref().and_then(|g| non_blank(g.base_url.as_deref()))
    }

    #[must_use]
    pub fn voice_command(&self) -> Option<(&str, &[String])> {
        let voice = self.voice.as_ref()?;
        let command = non_blank(voice.command.as_deref())?;
        Some((command, voice.args.as_slice()))
    }

    #[must_use]
    pub fn retry(&self) -> ResolvedRetry {
        let raw = self.retry.as_ref();
        let timeout_secs = raw
            .and_then(|r| r.request_timeout_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        ResolvedRetry {
            max_attempts: raw
                .and_then(|r| r.max_attempts)
                .unwrap_or(DEFAULT_MAX_ATTEMPTS)
                .max(1),
            initial_delay: Duration::from_millis(
                raw.and_then(|r| r.initial_delay_ms)
                    .unwrap_or(DEFAULT_INITIAL_DELAY_MS),
            ),
            max_delay: Duration::from_millis(
                raw.and_then(|r| r.max_delay_ms)
                    .unwrap_or(DEFAULT_MAX_DELAY_MS),
            ),
            jitter_factor: raw
                .and_then(|r| r.jitter_factor)
                .filter(|j| j.is_finite())
                .unwrap_or(DEFAULT_JITTER_FACTOR)
                .clamp(0.0, 1.0),
            request_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        }
    }
}

/// Retry knobs with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRetry {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub jitter_factor: f64,
    pub request_timeout: Option<Duration>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `~/.orion`, home of the config, the vault, and logs.
#[must_use]
pub fn orion_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".orion"))
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    orion_dir().map(|dir| dir.join("config.toml"))
}
