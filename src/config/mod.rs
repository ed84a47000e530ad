//! Configuration management for Hark
//!
//! Values resolve with priority env > TOML file > default.

pub mod file;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::{Error, Result};

pub use file::HarkConfigFile;

/// Default NLU service base URL
pub const DEFAULT_NLU_URL: &str = "http://localhost:8000/";

/// Default recognition locale
pub const DEFAULT_LOCALE: &str = "en-US";

/// Hark configuration
#[derive(Debug)]
pub struct Config {
    /// NLU service configuration
    pub nlu: NluConfig,

    /// Speech capture configuration
    pub capture: CaptureConfig,

    /// Speech synthesis configuration
    pub speech: SpeechConfig,

    /// Answer cache configuration
    pub cache: CacheConfig,

    /// Path to data directory (cache database)
    pub data_dir: PathBuf,

    /// `OpenAI` API key (Whisper STT and TTS)
    pub openai_api_key: Option<SecretString>,
}

/// NLU service configuration
#[derive(Debug, Clone)]
pub struct NluConfig {
    /// Base URL; `chat` and `status` are resolved against it
    pub base_url: Url,

    /// Request timeout (none by default)
    pub timeout: Option<Duration>,
}

/// Where transcripts come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureBackend {
    /// Typed line on stdin
    #[default]
    Keyboard,
    /// Microphone + Whisper
    Microphone,
}

impl FromStr for CaptureBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "keyboard" | "stdin" | "text" => Ok(Self::Keyboard),
            "microphone" | "mic" => Ok(Self::Microphone),
            other => Err(Error::Config(format!("unknown capture backend: {other}"))),
        }
    }
}

/// Speech capture configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub backend: CaptureBackend,

    /// Recognition locale (e.g. "en-US")
    pub locale: String,

    /// STT model for the microphone backend
    pub stt_model: String,

    /// Longest a single capture session may run
    pub max_listen: Duration,
}

/// Where answers are spoken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeechBackend {
    /// Print utterances to the terminal
    #[default]
    Console,
    /// `OpenAI` TTS played on the default output device
    OpenAi,
}

impl FromStr for SpeechBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "console" | "text" => Ok(Self::Console),
            "openai" | "speaker" => Ok(Self::OpenAi),
            other => Err(Error::Config(format!("unknown speech backend: {other}"))),
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub backend: SpeechBackend,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,
}

/// Answer cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Consult the cache before calling the NLU service
    pub enabled: bool,

    /// Store every answer fetched from the network
    pub write_through: bool,

    /// `SQLite` database file
    pub path: PathBuf,
}

impl Config {
    /// Load configuration from the environment and the standard config file
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is invalid
    pub fn load() -> Result<Self> {
        Self::from_sources(&file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is invalid
    pub fn from_sources<F>(fc: &HarkConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // NLU endpoint (env > toml > default)
        let raw_url = env("HARK_NLU_URL")
            .or_else(|| fc.nlu.url.clone())
            .unwrap_or_else(|| DEFAULT_NLU_URL.to_string());
        let timeout = env("HARK_NLU_TIMEOUT_SECS")
            .and_then(|s| match s.trim().parse::<u64>() {
                Ok(secs) => Some(secs),
                Err(e) => {
                    tracing::warn!(value = %s, error = %e, "ignoring invalid HARK_NLU_TIMEOUT_SECS");
                    None
                }
            })
            .or(fc.nlu.timeout_secs)
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs);
        let nlu = NluConfig {
            base_url: parse_base_url(&raw_url)?,
            timeout,
        };

        let capture = CaptureConfig {
            backend: env("HARK_CAPTURE")
                .or_else(|| fc.capture.backend.clone())
                .map(|s| s.parse::<CaptureBackend>())
                .transpose()?
                .unwrap_or_default(),
            locale: env("HARK_LOCALE")
                .or_else(|| fc.capture.locale.clone())
                .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            stt_model: env("HARK_STT_MODEL")
                .or_else(|| fc.capture.stt_model.clone())
                .unwrap_or_else(|| "whisper-1".to_string()),
            max_listen: Duration::from_secs(fc.capture.max_listen_secs.unwrap_or(15)),
        };

        let speech = SpeechConfig {
            backend: env("HARK_SPEECH")
                .or_else(|| fc.speech.backend.clone())
                .map(|s| s.parse::<SpeechBackend>())
                .transpose()?
                .unwrap_or_default(),
            tts_model: env("HARK_TTS_MODEL")
                .or_else(|| fc.speech.tts_model.clone())
                .unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: env("HARK_TTS_VOICE")
                .or_else(|| fc.speech.tts_voice.clone())
                .unwrap_or_else(|| "alloy".to_string()),
            tts_speed: fc.speech.tts_speed.unwrap_or(1.0).clamp(0.25, 4.0),
        };

        // Determine data directory (~/.local/share/hark on Linux)
        let data_dir = directories::BaseDirs::new()
            .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("hark"));

        let cache = CacheConfig {
            enabled: env("HARK_CACHE")
                .map(|v| parse_flag("HARK_CACHE", &v))
                .transpose()?
                .or(fc.cache.enabled)
                .unwrap_or(true),
            write_through: env("HARK_CACHE_WRITE_THROUGH")
                .map(|v| parse_flag("HARK_CACHE_WRITE_THROUGH", &v))
                .transpose()?
                .or(fc.cache.write_through)
                .unwrap_or(true),
            path: env("HARK_CACHE_PATH")
                .or_else(|| fc.cache.path.clone())
                .map_or_else(|| data_dir.join("cache.db"), PathBuf::from),
        };

        let openai_api_key = env("OPENAI_API_KEY")
            .or_else(|| fc.api_keys.openai.clone())
            .filter(|k| !k.is_empty())
            .map(SecretString::from);

        Ok(Self {
            nlu,
            capture,
            speech,
            cache,
            data_dir,
            openai_api_key,
        })
    }

    /// Override the NLU base URL (e.g. from a CLI flag)
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid
    pub fn set_nlu_url(&mut self, raw: &str) -> Result<()> {
        self.nlu.base_url = parse_base_url(raw)?;
        Ok(())
    }
}

/// Parse a base URL, accepting either the service root or its `/chat` endpoint
///
/// The result always ends with `/` so endpoint names join beneath it.
///
/// # Errors
///
/// Returns error if the URL is invalid or not http(s)
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url =
        Url::parse(raw.trim()).map_err(|e| Error::Config(format!("invalid NLU url {raw}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "NLU url must be http or https: {raw}"
        )));
    }

    let mut path = url.path().trim_end_matches('/').to_string();
    if let Some(stripped) = path.strip_suffix("/chat") {
        path = stripped.to_string();
    }
    path.push('/');
    url.set_path(&path);

    Ok(url)
}

/// Parse a boolean env var; anything unrecognised is an error
fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{name} must be true or false, got {value:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_sources(&HarkConfigFile::default(), env_of(&[])).unwrap();

        assert_eq!(config.nlu.base_url.as_str(), "http://localhost:8000/");
        assert!(config.nlu.timeout.is_none());
        assert_eq!(config.capture.backend, CaptureBackend::Keyboard);
        assert_eq!(config.capture.locale, "en-US");
        assert_eq!(config.speech.backend, SpeechBackend::Console);
        assert!(config.cache.enabled);
        assert!(config.cache.write_through);
        assert!(config.cache.path.ends_with("cache.db"));
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let fc: HarkConfigFile = toml::from_str(
            r#"
            [nlu]
            url = "http://from-file:9000"

            [capture]
            backend = "microphone"
            locale = "de-DE"
            "#,
        )
        .unwrap();

        let config = Config::from_sources(
            &fc,
            env_of(&[("HARK_NLU_URL", "http://from-env:8001"), ("HARK_CACHE", "false")]),
        )
        .unwrap();

        assert_eq!(config.nlu.base_url.as_str(), "http://from-env:8001/");
        assert_eq!(config.capture.backend, CaptureBackend::Microphone);
        assert_eq!(config.capture.locale, "de-DE");
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_base_url_accepts_chat_endpoint() {
        let url = parse_base_url("http://localhost:8001/chat").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8001/");
        assert_eq!(url.join("chat").unwrap().as_str(), "http://localhost:8001/chat");

        let nested = parse_base_url("https://example.com/api/").unwrap();
        assert_eq!(nested.join("status").unwrap().as_str(), "https://example.com/api/status");
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(matches!(parse_base_url("not a url"), Err(Error::Config(_))));
        assert!(matches!(parse_base_url("ftp://host/"), Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = Config::from_sources(
            &HarkConfigFile::default(),
            env_of(&[("HARK_SPEECH", "carrier-pigeon")]),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_api_key_ignored() {
        let config =
            Config::from_sources(&HarkConfigFile::default(), env_of(&[("OPENAI_API_KEY", "")]))
                .unwrap();
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_misspelled_flag_rejected() {
        let result =
            Config::from_sources(&HarkConfigFile::default(), env_of(&[("HARK_CACHE", "ture")]));
        assert!(matches!(result, Err(Error::Config(_))));

        let config = Config::from_sources(
            &HarkConfigFile::default(),
            env_of(&[("HARK_CACHE", "Off"), ("HARK_CACHE_WRITE_THROUGH", "YES")]),
        )
        .unwrap();
        assert!(!config.cache.enabled);
        assert!(config.cache.write_through);
    }

    #[test]
    fn test_timeout_zero_and_garbage_mean_none() {
        let config = Config::from_sources(
            &HarkConfigFile::default(),
            env_of(&[("HARK_NLU_TIMEOUT_SECS", "0")]),
        )
        .unwrap();
        assert!(config.nlu.timeout.is_none());

        let mut fc = HarkConfigFile::default();
        fc.nlu.timeout_secs = Some(30);
        let config =
            Config::from_sources(&fc, env_of(&[("HARK_NLU_TIMEOUT_SECS", "soon")])).unwrap();
        assert_eq!(config.nlu.timeout, Some(Duration::from_secs(30)));

        let config = Config::from_sources(
            &HarkConfigFile::default(),
            env_of(&[("HARK_NLU_TIMEOUT_SECS", " 12 ")]),
        )
        .unwrap();
        assert_eq!(config.nlu.timeout, Some(Duration::from_secs(12)));
    }
}
