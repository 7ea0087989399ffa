use std::time::Duration;

use serde::Deserialize;
use uuid::Uuid;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("a {0} must be provided")]
    MissingField(&'static str),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Validated connection/session settings.
///
/// Construct through [`SessionConfig::builder`] or [`SessionConfig::from_toml_str`];
/// both paths run the same validation, so a `SessionConfig` value is always
/// complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub service: String,
    pub domain: String,
    /// Connected-resource suffix; minted when not supplied.
    pub resource: String,
    pub username: String,
    pub password: String,
    /// How long a correlated request waits before resolving empty.
    pub request_timeout: Duration,
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let parsed: RawConfig = toml::from_str(raw)?;

        let mut builder = Self::builder()
            .service(parsed.service)
            .domain(parsed.domain)
            .username(parsed.username)
            .password(parsed.password);
        if let Some(resource) = parsed.resource {
            builder = builder.resource(resource);
        }
        if let Some(secs) = parsed.request_timeout_secs {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        builder.build()
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    service: String,
    #[serde(default)]
    domain: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    resource: Option<String>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    service: String,
    domain: String,
    resource: String,
    username: String,
    password: String,
    request_timeout: Option<Duration>,
}

impl SessionConfigBuilder {
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Optional; a fresh resource is minted when none is provided.
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<SessionConfig, ConfigError> {
        if self.service.is_empty() {
            return Err(ConfigError::MissingField("service"));
        }
        if self.domain.is_empty() {
            return Err(ConfigError::MissingField("domain"));
        }
        if self.username.is_empty() {
            return Err(ConfigError::MissingField("username"));
        }
        if self.password.is_empty() {
            return Err(ConfigError::MissingField("password"));
        }

        let resource = if self.resource.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            self.resource
        };

        Ok(SessionConfig {
            service: self.service,
            domain: self.domain,
            resource,
            username: self.username,
            password: self.password,
            request_timeout: self
                .request_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn minimal_builder() -> SessionConfigBuilder {
        SessionConfig::builder()
            .service("xmpp://example.com:5222")
            .domain("example.com")
            .username("alice")
            .password("hunter2")
    }

    #[test]
    fn builder_accepts_complete_config() {
        let config = minimal_builder()
            .resource("desktop")
            .request_timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        assert_eq!(config.domain, "example.com");
        assert_eq!(config.resource, "desktop");
        assert_eq!(config.request_timeout, Duration::from_secs(2));
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let builder = SessionConfig::builder()
            .domain("example.com")
            .username("alice")
            .password("hunter2");
        assert_matches!(builder.build(), Err(ConfigError::MissingField("service")));

        let builder = SessionConfig::builder()
            .service("xmpp://example.com:5222")
            .username("alice")
            .password("hunter2");
        assert_matches!(builder.build(), Err(ConfigError::MissingField("domain")));

        let builder = SessionConfig::builder()
            .service("xmpp://example.com:5222")
            .domain("example.com")
            .password("hunter2");
        assert_matches!(builder.build(), Err(ConfigError::MissingField("username")));

        let builder = SessionConfig::builder()
            .service("xmpp://example.com:5222")
            .domain("example.com")
            .username("alice");
        assert_matches!(builder.build(), Err(ConfigError::MissingField("password")));
    }

    #[test]
    fn resource_is_minted_when_absent() {
        let first = minimal_builder().build().unwrap();
        let second = minimal_builder().build().unwrap();

        assert!(!first.resource.is_empty());
        assert_ne!(first.resource, second.resource);
    }

    #[test]
    fn request_timeout_defaults_to_five_seconds() {
        let config = minimal_builder().build().unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn from_toml_parses_and_validates() {
        let config = SessionConfig::from_toml_str(
            r#"
            service = "xmpp://example.com:5222"
            domain = "example.com"
            username = "alice"
            password = "hunter2"
            resource = "laptop"
            request_timeout_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.resource, "laptop");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn from_toml_rejects_incomplete_config() {
        let result = SessionConfig::from_toml_str(
            r#"
            domain = "example.com"
            username = "alice"
            password = "hunter2"
            "#,
        );
        assert_matches!(result, Err(ConfigError::MissingField("service")));
    }

    #[test]
    fn from_toml_rejects_malformed_input() {
        assert_matches!(
            SessionConfig::from_toml_str("not [valid"),
            Err(ConfigError::Parse(_))
        );
    }
}
