//! Streamer Configuration Settings
//!
//! Configuration types for the streamer, loaded from environment variables.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server listen settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Listen address.
    pub bind_addr: IpAddr,
    /// HTTP port for the viewer, stream, health, and metrics routes.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: 8080,
        }
    }
}

/// Per-stream defaults, overridable by query parameters.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Tokenizer used when the request omits `tokenizer`.
    pub default_tokenizer: String,
    /// Delay used when the request omits `delay`.
    pub default_delay: Duration,
    /// Events buffered between a session and its socket.
    pub channel_capacity: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            default_tokenizer: "gpt2".to_string(),
            default_delay: Duration::from_millis(20),
            channel_capacity: 64,
        }
    }
}

/// Tokenizer backend settings.
#[derive(Debug, Clone, Default)]
pub struct TokenizerSettings {
    /// Directory of `<repo id>/tokenizer.json` files used before the Hub.
    pub tokenizer_dir: Option<PathBuf>,
    /// Hub repositories allowed in addition to the defaults.
    pub extra_hf_repos: Vec<String>,
    /// Resolve the default tokenizer at start-up.
    pub preload: bool,
}

/// Complete streamer configuration.
#[derive(Debug, Clone, Default)]
pub struct StreamerConfig {
    /// Listen settings.
    pub server: ServerSettings,
    /// Stream defaults.
    pub stream: StreamSettings,
    /// Tokenizer backends.
    pub tokenizers: TokenizerSettings,
    /// Corpus file; `None` uses the bundled dashboard.
    pub document_path: Option<PathBuf>,
}

impl StreamerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the default tokenizer is empty or the bind
    /// address does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server_defaults = ServerSettings::default();
        let bind_addr = match lookup("STREAMER_BIND_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue("STREAMER_BIND_ADDR".to_string(), raw))?,
            None => server_defaults.bind_addr,
        };
        let server = ServerSettings {
            bind_addr,
            port: parse_u16(&lookup, "STREAMER_PORT", server_defaults.port),
        };

        let stream_defaults = StreamSettings::default();
        let default_tokenizer = lookup("STREAMER_DEFAULT_TOKENIZER")
            .unwrap_or(stream_defaults.default_tokenizer);
        if default_tokenizer.trim().is_empty() {
            return Err(ConfigError::EmptyValue(
                "STREAMER_DEFAULT_TOKENIZER".to_string(),
            ));
        }
        let stream = StreamSettings {
            default_tokenizer,
            default_delay: parse_duration_millis(
                &lookup,
                "STREAMER_DEFAULT_DELAY_MS",
                stream_defaults.default_delay,
            ),
            channel_capacity: parse_usize(
                &lookup,
                "STREAMER_CHANNEL_CAPACITY",
                stream_defaults.channel_capacity,
            )
            .max(1),
        };

        let tokenizers = TokenizerSettings {
            tokenizer_dir: non_empty(&lookup, "STREAMER_TOKENIZER_DIR").map(PathBuf::from),
            extra_hf_repos: non_empty(&lookup, "STREAMER_HF_TOKENIZERS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(ToString::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            preload: lookup("STREAMER_PRELOAD").is_some_and(|v| v.eq_ignore_ascii_case("true")),
        };

        Ok(Self {
            server,
            stream,
            tokenizers,
            document_path: non_empty(&lookup, "STREAMER_DOCUMENT_PATH").map(PathBuf::from),
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable could not be parsed.
    #[error("environment variable {0} has invalid value {1:?}")]
    InvalidValue(String, String),
}

fn parse_u16(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u16) -> u16 {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_usize(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> usize {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_duration_millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Duration {
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<StreamerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StreamerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind_addr, IpAddr::from([0, 0, 0, 0]));
        assert_eq!(config.stream.default_tokenizer, "gpt2");
        assert_eq!(config.stream.default_delay, Duration::from_millis(20));
        assert_eq!(config.stream.channel_capacity, 64);
        assert!(config.document_path.is_none());
        assert!(config.tokenizers.tokenizer_dir.is_none());
        assert!(config.tokenizers.extra_hf_repos.is_empty());
        assert!(!config.tokenizers.preload);
    }

    #[test]
    fn overrides_from_environment() {
        let config = config(&[
            ("STREAMER_PORT", "9000"),
            ("STREAMER_BIND_ADDR", "127.0.0.1"),
            ("STREAMER_DEFAULT_TOKENIZER", "o200k_base"),
            ("STREAMER_DEFAULT_DELAY_MS", "0"),
            ("STREAMER_CHANNEL_CAPACITY", "8"),
            ("STREAMER_DOCUMENT_PATH", "/tmp/page.html"),
            ("STREAMER_TOKENIZER_DIR", "/models"),
            ("STREAMER_HF_TOKENIZERS", "Qwen/Qwen2.5-0.5B, ,roberta-base"),
            ("STREAMER_PRELOAD", "TRUE"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, IpAddr::from([127, 0, 0, 1]));
        assert_eq!(config.stream.default_tokenizer, "o200k_base");
        assert_eq!(config.stream.default_delay, Duration::ZERO);
        assert_eq!(config.stream.channel_capacity, 8);
        assert_eq!(config.document_path, Some(PathBuf::from("/tmp/page.html")));
        assert_eq!(config.tokenizers.tokenizer_dir, Some(PathBuf::from("/models")));
        assert_eq!(
            config.tokenizers.extra_hf_repos,
            vec!["Qwen/Qwen2.5-0.5B".to_string(), "roberta-base".to_string()]
        );
        assert!(config.tokenizers.preload);
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let config = config(&[
            ("STREAMER_PORT", "not-a-port"),
            ("STREAMER_DEFAULT_DELAY_MS", "-5"),
            ("STREAMER_CHANNEL_CAPACITY", "0"),
        ])
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.stream.default_delay, Duration::from_millis(20));
        assert_eq!(config.stream.channel_capacity, 1);
    }

    #[test]
    fn empty_default_tokenizer_rejected() {
        let err = config(&[("STREAMER_DEFAULT_TOKENIZER", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyValue(_)));
    }

    #[test]
    fn bad_bind_addr_rejected() {
        let err = config(&[("STREAMER_BIND_ADDR", "localhost:80")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_, _)));
    }
}
