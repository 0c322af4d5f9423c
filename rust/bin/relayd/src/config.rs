//! Relay configuration.
//!
//! Optional TOML file, then environment overrides:
//!
//! ```toml
//! [reddit]
//! client_id = "..."
//! client_secret = "..."
//! user_agent = "subsearch-relay/0.1"
//!
//! [server]
//! listen = "0.0.0.0:3001"
//! ```
//!
//! `REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET` and `PORT` take precedence over
//! the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use subsearch_client::{DEFAULT_API_BASE, DEFAULT_AUTH_BASE};

pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{0} is not set (use the config file or the {1} environment variable)")]
    MissingCredential(&'static str, &'static str),

    #[error("invalid PORT '{0}'")]
    InvalidPort(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub reddit: RedditConfig,
    #[serde(default)]
    pub server: ServerSection,
}

/// Upstream credentials and endpoints. Stays on the relay host.
#[derive(Clone, Deserialize)]
pub struct RedditConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default = "default_auth_base")]
    pub auth_base: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            user_agent: None,
            auth_base: default_auth_base(),
            api_base: default_api_base(),
        }
    }
}

// Secret stays out of logs.
impl std::fmt::Debug for RedditConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("auth_base", &self.auth_base)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub listen: Option<String>,
}

fn default_auth_base() -> String {
    DEFAULT_AUTH_BASE.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl RelayConfig {
    /// Load from `path`, or start from defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET` and `PORT`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = lookup("REDDIT_CLIENT_ID").filter(|v| !v.is_empty()) {
            self.reddit.client_id = id;
        }
        if let Some(secret) = lookup("REDDIT_CLIENT_SECRET").filter(|v| !v.is_empty()) {
            self.reddit.client_secret = secret;
        }
        if let Some(port) = lookup("PORT").filter(|v| !v.is_empty()) {
            let port: u16 = port.trim().parse().map_err(|_| ConfigError::InvalidPort(port.clone()))?;
            self.server.listen = Some(format!("0.0.0.0:{}", port));
        }
        Ok(())
    }

    /// Refuse to start without both credentials.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reddit.client_id.trim().is_empty() {
            return Err(ConfigError::MissingCredential("reddit.client_id", "REDDIT_CLIENT_ID"));
        }
        if self.reddit.client_secret.trim().is_empty() {
            return Err(ConfigError::MissingCredential(
                "reddit.client_secret",
                "REDDIT_CLIENT_SECRET",
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        self.server
            .listen
            .clone()
            .unwrap_or_else(|| format!("0.0.0.0:{}", DEFAULT_PORT))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_file_with_defaults_for_missing_keys() {
        let file = write_config(
            r#"
[reddit]
client_id = "abc"
client_secret = "shh"
"#,
        );
        let config = RelayConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.reddit.client_id, "abc");
        assert_eq!(config.reddit.auth_base, DEFAULT_AUTH_BASE);
        assert_eq!(config.reddit.api_base, DEFAULT_API_BASE);
        assert_eq!(config.listen_addr(), "0.0.0.0:3001");
        config.validate().unwrap();
    }

    #[test]
    fn env_overrides_file() {
        let file = write_config(
            r#"
[reddit]
client_id = "from-file"
client_secret = "file-secret"

[server]
listen = "127.0.0.1:9000"
"#,
        );
        let mut config = RelayConfig::load(Some(file.path())).unwrap();
        config
            .apply_env(env(&[("REDDIT_CLIENT_ID", "from-env"), ("PORT", "4000")]))
            .unwrap();

        assert_eq!(config.reddit.client_id, "from-env");
        assert_eq!(config.reddit.client_secret, "file-secret");
        assert_eq!(config.listen_addr(), "0.0.0.0:4000");
    }

    #[test]
    fn env_alone_is_enough() {
        let mut config = RelayConfig::load(None).unwrap();
        config
            .apply_env(env(&[("REDDIT_CLIENT_ID", "id"), ("REDDIT_CLIENT_SECRET", "secret")]))
            .unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn missing_credentials_fail_validation() {
        let config = RelayConfig::load(None).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("REDDIT_CLIENT_ID"), "got: {}", err);

        let mut config = RelayConfig::default();
        config.reddit.client_id = "id".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCredential("reddit.client_secret", _))
        ));
    }

    #[test]
    fn bad_port_is_rejected() {
        let mut config = RelayConfig::default();
        let err = config.apply_env(env(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(_)));
    }

    #[test]
    fn missing_or_malformed_file() {
        let err = RelayConfig::load(Some(Path::new("/nonexistent/relay.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let file = write_config("[reddit\nclient_id = 1");
        let err = RelayConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn debug_redacts_secret() {
        let mut config = RelayConfig::default();
        config.reddit.client_secret = "hunter2".into();
        let shown = format!("{:?}", config);
        assert!(!shown.contains("hunter2"));
    }
}
