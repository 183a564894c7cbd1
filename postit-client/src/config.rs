//! Configuration loading for the postit client.
//!
//! All fields are required unless explicitly marked optional. No defaults.

use postit_core::OwnerId;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "POSTIT_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub auth: AuthConfig,
    /// Per-request HTTP timeout.
    pub request_timeout_ms: u64,
    /// Bound on a whole store call as seen by the note manager.
    pub store_timeout_ms: u64,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub log_filter: String,
    #[serde(default)]
    pub session: Option<SessionConfig>,
    /// Serve notes from an in-memory store instead of the API.
    #[serde(default)]
    pub offline: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub api_key: Option<String>,
    pub jwt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    pub owner_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or POSTIT_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args(std::env::args().skip(1)).or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !self.offline && self.auth.api_key.is_none() && self.auth.jwt.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "auth",
                reason: "api_key or jwt must be provided".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "store_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log_filter",
                reason: "must not be empty".to_string(),
            });
        }
        if let Some(session) = &self.session {
            if let Err(err) = OwnerId::parse(&session.owner_id) {
                return Err(ConfigError::InvalidValue {
                    field: "session.owner_id",
                    reason: err.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Owner of the configured session, if any.
    pub fn session_owner(&self) -> Option<OwnerId> {
        self.session
            .as_ref()
            .and_then(|session| OwnerId::parse(&session.owner_id).ok())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from)
}

fn config_path_from_args(mut args: impl Iterator<Item = String>) -> Option<PathBuf> {
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID: &str = r#"
api_base_url = "http://localhost:8080/"
request_timeout_ms = 5000
store_timeout_ms = 8000
log_filter = "info,postit_client=debug"

[auth]
api_key = "secret"

[session]
owner_id = "user-1"
"#;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn parse(contents: &str) -> ClientConfig {
        toml::from_str(contents).unwrap()
    }

    #[test]
    fn test_from_path_reads_valid_config() {
        let file = write_config(VALID);
        let config = ClientConfig::from_path(file.path()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.request_timeout_ms, 5000);
        assert_eq!(config.auth.api_key.as_deref(), Some("secret"));
        assert!(config.auth.jwt.is_none());
        assert!(!config.offline);
        assert_eq!(config.session_owner(), Some(OwnerId::parse("user-1").unwrap()));
    }

    #[test]
    fn test_from_path_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ClientConfig::from_path(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let file = write_config(&format!("{}\ntheme = \"dark\"\n", VALID));
        let result = ClientConfig::from_path(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_requires_credentials_unless_offline() {
        let mut config = parse(VALID);
        config.auth.api_key = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "auth", .. })
        ));

        config.offline = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = parse(VALID);
        config.store_timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "store_timeout_ms", .. })
        ));

        let mut config = parse(VALID);
        config.request_timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "request_timeout_ms", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_blank_session_owner() {
        let mut config = parse(VALID);
        config.session = Some(SessionConfig {
            owner_id: "   ".to_string(),
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "session.owner_id", .. })
        ));
    }

    #[test]
    fn test_session_is_optional() {
        let contents = VALID.replace("[session]\nowner_id = \"user-1\"\n", "");
        let config = parse(&contents);
        assert!(config.session.is_none());
        assert!(config.session_owner().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_path_from_args() {
        let args = ["--verbose", "--config", "/tmp/postit.toml"].map(String::from);
        assert_eq!(
            config_path_from_args(args.into_iter()),
            Some(PathBuf::from("/tmp/postit.toml"))
        );

        let dangling = ["--config"].map(String::from);
        assert_eq!(config_path_from_args(dangling.into_iter()), None);
    }
}
