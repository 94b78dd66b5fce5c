//! Duplex CLI Configuration Management
//!
//! Configuration is a single TOML file. Every setting has a default except the
//! operator account, which `validate()` insists on before the relay starts.
//! Offline directory commands only need `[directory]`, so loading and
//! validation are separate steps.

use std::path::{Path, PathBuf};
use std::time::Duration;

use duplex_core::{format::DEFAULT_MAX_MESSAGE_CHARS, ChannelId};
use duplex_gateway::GatewayConfig;
use duplex_runtime::{RetryPolicy, RouterConfig};
use serde::{Deserialize, Serialize};
use url::Url;

/// Looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "duplex.toml";

// ----------------------------------------------------------------------------
// Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the `duplex` binary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub control: ControlConfig,
    pub field: FieldConfig,
    pub directory: DirectoryConfig,
    pub supervisor: SupervisorConfig,
}

/// Operator-facing network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Operator account id; also the operator's direct chat
    pub operator_id: ChannelId,
    pub gateway_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Longer outbound messages are split into several
    pub max_message_chars: usize,
}

/// Peer-facing network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub gateway_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// JSON file holding contacts, group bindings and the blacklist
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Wait between a connection failure and the next attempt
    pub retry_delay_secs: u64,
}

// ----------------------------------------------------------------------------
// Default Implementations
// ----------------------------------------------------------------------------

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            operator_id: 0,
            gateway_url: "ws://127.0.0.1:8701".to_string(),
            auth_token: None,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
        }
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            gateway_url: "ws://127.0.0.1:8702".to_string(),
            auth_token: None,
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("directory.json"),
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            retry_delay_secs: 10,
        }
    }
}

// ----------------------------------------------------------------------------
// Configuration Loading Logic
// ----------------------------------------------------------------------------

impl AppConfig {
    /// Parse a configuration file; missing keys take their defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileSystem(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&contents).map_err(|e| {
            ConfigError::Loading(format!("Failed to load from {}: {}", path.display(), e))
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Loading(e.to_string()))
    }

    /// Check everything the relay needs before it connects
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control.operator_id == 0 {
            return Err(ConfigError::Validation(
                "control.operator_id must be set".to_string(),
            ));
        }

        if self.control.max_message_chars == 0 {
            return Err(ConfigError::Validation(
                "control.max_message_chars must be greater than 0".to_string(),
            ));
        }

        if self.supervisor.retry_delay_secs == 0 {
            return Err(ConfigError::Validation(
                "supervisor.retry_delay_secs must be greater than 0".to_string(),
            ));
        }

        parse_gateway_url("control.gateway_url", &self.control.gateway_url)?;
        parse_gateway_url("field.gateway_url", &self.field.gateway_url)?;

        Ok(())
    }

    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            operator_id: self.control.operator_id,
            max_message_chars: self.control.max_message_chars,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::FixedDelay(Duration::from_secs(self.supervisor.retry_delay_secs))
    }

    pub fn control_gateway(&self) -> Result<GatewayConfig, ConfigError> {
        gateway_config(
            "control.gateway_url",
            &self.control.gateway_url,
            self.control.auth_token.as_deref(),
        )
    }

    pub fn field_gateway(&self) -> Result<GatewayConfig, ConfigError> {
        gateway_config(
            "field.gateway_url",
            &self.field.gateway_url,
            self.field.auth_token.as_deref(),
        )
    }

    /// Render as TOML with auth tokens masked
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut redacted = self.clone();
        for token in [
            &mut redacted.control.auth_token,
            &mut redacted.field.auth_token,
        ] {
            if token.is_some() {
                *token = Some("********".to_string());
            }
        }

        toml::to_string_pretty(&redacted)
            .map_err(|e| ConfigError::Serialization(format!("Failed to serialize config: {}", e)))
    }

    /// Create example configuration file content
    pub fn example_config() -> String {
        let example_config = AppConfig {
            control: ControlConfig {
                operator_id: 123456789,
                auth_token: Some("change-me".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        toml::to_string_pretty(&example_config)
            .unwrap_or_else(|_| "# Failed to generate example config".to_string())
    }
}

fn parse_gateway_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::Validation(format!("{} is not a valid URL: {}", key, e)))?;

    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(ConfigError::Validation(format!(
            "{} must use ws:// or wss://, got {}://",
            key, other
        ))),
    }
}

fn gateway_config(
    key: &str,
    raw: &str,
    auth_token: Option<&str>,
) -> Result<GatewayConfig, ConfigError> {
    let config = GatewayConfig::new(parse_gateway_url(key, raw)?);
    Ok(match auth_token {
        Some(token) => config.with_auth_token(token),
        None => config,
    })
}

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {0}")]
    Loading(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_needs_operator() {
        let config = AppConfig::default();
        assert_eq!(config.control.max_message_chars, 3000);
        assert_eq!(config.supervisor.retry_delay_secs, 10);
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_partial_file_takes_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [control]
            operator_id = 42

            [directory]
            path = "/var/lib/duplex/directory.json"
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.control.operator_id, 42);
        assert_eq!(config.field, FieldConfig::default());
        assert_eq!(
            config.directory.path,
            PathBuf::from("/var/lib/duplex/directory.json")
        );
        assert_eq!(config.router_config().operator_id, 42);
        assert_eq!(config.retry_policy().delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_config_validation() {
        let mut valid = AppConfig::default();
        valid.control.operator_id = 7;
        assert!(valid.validate().is_ok());

        let mut invalid = valid.clone();
        invalid.control.max_message_chars = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = valid.clone();
        invalid.supervisor.retry_delay_secs = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = valid.clone();
        invalid.field.gateway_url = "http://127.0.0.1:8702".to_string();
        let error = invalid.validate().unwrap_err().to_string();
        assert!(error.contains("field.gateway_url"));

        let mut invalid = valid;
        invalid.control.gateway_url = "not a url".to_string();
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_gateway_configs_carry_tokens() {
        let mut config = AppConfig::default();
        config.field.auth_token = Some("secret".to_string());

        let field = config.field_gateway().unwrap();
        assert_eq!(field.url.as_str(), "ws://127.0.0.1:8702/");
        assert_eq!(field.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.control_gateway().unwrap().auth_token, None);
    }

    #[test]
    fn test_redacted_output_hides_tokens() {
        let mut config = AppConfig::default();
        config.control.auth_token = Some("secret".to_string());

        let rendered = config.to_redacted_toml().unwrap();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("********"));
    }

    #[test]
    fn test_example_config_generation() {
        let example = AppConfig::example_config();
        assert!(example.contains("[control]"));
        assert!(example.contains("[field]"));
        assert!(example.contains("[directory]"));
        assert!(example.contains("[supervisor]"));

        let parsed = AppConfig::from_toml(&example).unwrap();
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_filesystem_error() {
        let result = AppConfig::load_from_file("/nonexistent/duplex.toml");
        assert!(matches!(result, Err(ConfigError::FileSystem(_))));
    }
}
