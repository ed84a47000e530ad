//! TOML configuration file loading
//!
//! Supports `~/.config/hark/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct HarkConfigFile {
    /// NLU service configuration
    #[serde(default)]
    pub nlu: NluFileConfig,

    /// Speech capture configuration
    #[serde(default)]
    pub capture: CaptureFileConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// Answer cache configuration
    #[serde(default)]
    pub cache: CacheFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// NLU service settings
#[derive(Debug, Default, Deserialize)]
pub struct NluFileConfig {
    /// Base URL of the service (e.g. `http://localhost:8000`)
    pub url: Option<String>,

    /// Request timeout in seconds; unset or 0 means wait indefinitely
    pub timeout_secs: Option<u64>,
}

/// Speech capture settings
#[derive(Debug, Default, Deserialize)]
pub struct CaptureFileConfig {
    /// "keyboard" or "microphone"
    pub backend: Option<String>,

    /// Recognition locale (e.g. "en-US")
    pub locale: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// Longest capture session in seconds
    pub max_listen_secs: Option<u64>,
}

/// Speech synthesis settings
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// "console" or "openai"
    pub backend: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,
}

/// Answer cache settings
#[derive(Debug, Default, Deserialize)]
pub struct CacheFileConfig {
    pub enabled: Option<bool>,
    pub write_through: Option<bool>,
    pub path: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `HarkConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> HarkConfigFile {
    config_file_path().map_or_else(HarkConfigFile::default, |path| load_from(&path))
}

/// Load a config file from an explicit path, falling back to defaults
pub fn load_from(path: &Path) -> HarkConfigFile {
    if !path.exists() {
        return HarkConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                HarkConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            HarkConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/hark/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("hark").join("config.toml"))
}
