use crate::defaults;
use crate::error::{Result, StreamError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub protocol: ProtocolConfig,
    pub source: SourceConfig,
    pub output: OutputConfig,
}

/// Event protocol configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProtocolConfig {
    pub record_prefix: String,
    pub audio_event: String,
}

/// Chunk source configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    pub chunk_size: usize,
}

/// Frame output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub channel_capacity: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            record_prefix: defaults::RECORD_PREFIX.to_string(),
            audio_event: defaults::AUDIO_EVENT.to_string(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            chunk_size: defaults::CHUNK_SIZE,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            channel_capacity: defaults::CHANNEL_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e.context(format!("Failed to load config from {}", path.display())))
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - TTSTREAM_AUDIO_EVENT → protocol.audio_event
    /// - TTSTREAM_RECORD_PREFIX → protocol.record_prefix
    /// - TTSTREAM_CHUNK_SIZE → source.chunk_size (ignored unless a positive integer)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(event) = std::env::var("TTSTREAM_AUDIO_EVENT")
            && !event.is_empty()
        {
            self.protocol.audio_event = event;
        }

        // An empty prefix is meaningful: records then carry bare JSON.
        if let Ok(prefix) = std::env::var("TTSTREAM_RECORD_PREFIX") {
            self.protocol.record_prefix = prefix;
        }

        if let Ok(size) = std::env::var("TTSTREAM_CHUNK_SIZE")
            && let Ok(size) = size.trim().parse::<usize>()
            && size > 0
        {
            self.source.chunk_size = size;
        }

        self
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.protocol.audio_event.trim().is_empty() {
            return Err(StreamError::ConfigInvalidValue {
                key: "protocol.audio_event".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.source.chunk_size == 0 {
            return Err(StreamError::ConfigInvalidValue {
                key: "source.chunk_size".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.output.channel_capacity == 0 {
            return Err(StreamError::ConfigInvalidValue {
                key: "output.channel_capacity".to_string(),
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| StreamError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/ttstream/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("ttstream")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_ttstream_env() {
        remove_env("TTSTREAM_AUDIO_EVENT");
        remove_env("TTSTREAM_RECORD_PREFIX");
        remove_env("TTSTREAM_CHUNK_SIZE");
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.protocol.record_prefix, "data: ");
        assert_eq!(config.protocol.audio_event, "tts_message");
        assert_eq!(config.source.chunk_size, 8192);
        assert_eq!(config.output.channel_capacity, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [protocol]
            record_prefix = "payload: "
            audio_event = "audio_chunk"

            [source]
            chunk_size = 1024

            [output]
            channel_capacity = 8
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.protocol.record_prefix, "payload: ");
        assert_eq!(config.protocol.audio_event, "audio_chunk");
        assert_eq!(config.source.chunk_size, 1024);
        assert_eq!(config.output.channel_capacity, 8);
    }

    #[test]
    fn test_partial_toml_uses_defaults_for_missing_fields() {
        let toml_content = r#"
            [source]
            chunk_size = 512
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.source.chunk_size, 512);
        assert_eq!(config.protocol, ProtocolConfig::default());
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[protocol\naudio_event = ").unwrap();

        assert!(Config::load(temp_file.path()).is_err());
        assert!(Config::load_or_default(temp_file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.toml");

        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_ttstream_env();

        set_env("TTSTREAM_AUDIO_EVENT", "speech_chunk");
        set_env("TTSTREAM_RECORD_PREFIX", "");
        set_env("TTSTREAM_CHUNK_SIZE", "4096");

        let config = Config::default().with_env_overrides();
        clear_ttstream_env();

        assert_eq!(config.protocol.audio_event, "speech_chunk");
        assert_eq!(config.protocol.record_prefix, "");
        assert_eq!(config.source.chunk_size, 4096);
    }

    #[test]
    fn test_env_overrides_ignore_invalid_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_ttstream_env();

        set_env("TTSTREAM_AUDIO_EVENT", "");
        set_env("TTSTREAM_CHUNK_SIZE", "zero");

        let config = Config::default().with_env_overrides();
        clear_ttstream_env();

        assert_eq!(config.protocol.audio_event, "tts_message");
        assert_eq!(config.source.chunk_size, 8192);
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let mut config = Config::default();
        config.source.chunk_size = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("source.chunk_size"));
    }

    #[test]
    fn test_validate_rejects_empty_audio_event() {
        let mut config = Config::default();
        config.protocol.audio_event = "  ".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("protocol.audio_event"));
    }

    #[test]
    fn test_validate_rejects_zero_channel_capacity() {
        let mut config = Config::default();
        config.output.channel_capacity = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_toml_roundtrips() {
        let mut config = Config::default();
        config.protocol.audio_event = "audio_chunk".to_string();

        let rendered = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let path = Config::default_path();
        assert!(path.ends_with("ttstream/config.toml"));
    }
}
