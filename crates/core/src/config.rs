//! Engine configuration.
//!
//! Defaults come from [`AuthConfig::default`], optionally overridden by a TOML
//! file and then by `WARDEN_*` environment variables. The resulting value is
//! handed explicitly to whatever needs it; nothing here is global.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Charset;

/// Prefix of the environment variables read by [`ConfigLoader`].
pub const ENV_PREFIX: &str = "WARDEN_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Charset used to turn textual secrets into bytes.
    pub charset: Charset,

    /// Header inspected by the built-in HTTP token resolvers.
    pub authorization_header: String,

    pub basic_scheme: String,

    pub bearer_scheme: String,

    /// Reject stored credentials whose expiry date has passed.
    pub check_credential_expiry: bool,

    /// Default `tracing` filter when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            charset: Charset::Utf8,
            authorization_header: "Authorization".to_string(),
            basic_scheme: "Basic".to_string(),
            bearer_scheme: "Bearer".to_string(),
            check_credential_expiry: true,
            log_filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to extract configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Layered configuration loader.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Merge defaults, the TOML file (if configured and present) and the
    /// environment, later sources overriding earlier ones.
    pub fn load(&self) -> Result<AuthConfig, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(AuthConfig::default()));

        if let Some(path) = &self.config_path {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
                tracing::debug!(path = %path.display(), "loaded configuration file");
            } else {
                tracing::debug!(path = %path.display(), "configuration file not found, skipping");
            }
        }

        figment = figment.merge(Env::prefixed(&self.env_prefix));

        let config: AuthConfig = figment.extract().map_err(Box::new)?;
        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &AuthConfig) -> Result<(), ConfigError> {
    if config.authorization_header.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "authorization_header cannot be empty".to_string(),
        ));
    }

    for (field, scheme) in [
        ("basic_scheme", &config.basic_scheme),
        ("bearer_scheme", &config.bearer_scheme),
    ] {
        if scheme.is_empty() || scheme.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "{field} must be a single non-empty word"
            )));
        }
    }

    Ok(())
}
