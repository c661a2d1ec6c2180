//! SMTP connection settings.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 25;

/// Name sent with EHLO/HELO when none is configured.
pub const DEFAULT_HELO_NAME: &str = "localhost";

/// SMTP server configuration.
///
/// Missing fields take their defaults when deserializing, so `{}` is a
/// valid configuration for an unauthenticated server on `localhost:25`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Username for AUTH PLAIN. Empty disables authentication.
    pub username: String,
    /// Password for AUTH PLAIN.
    pub password: String,
    /// Client name announced with EHLO/HELO.
    pub helo_name: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            username: String::new(),
            password: String::new(),
            helo_name: DEFAULT_HELO_NAME.to_string(),
        }
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("helo_name", &self.helo_name)
            .finish()
    }
}

impl SmtpConfig {
    /// Creates a configuration for an unauthenticated server.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Sets the AUTH PLAIN credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Sets the name announced with EHLO/HELO.
    #[must_use]
    pub fn with_helo_name(mut self, name: impl Into<String>) -> Self {
        self.helo_name = name.into();
        self
    }

    /// Returns the credentials, if a username is configured.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.username.is_empty() {
            None
        } else {
            Some((&self.username, &self.password))
        }
    }

    /// Checks that the configuration can be used to connect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host is empty, the port is zero, or
    /// the HELO name is empty or contains whitespace.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("host is empty".into()));
        }
        if self.port == 0 {
            return Err(Error::Config("port must not be 0".into()));
        }
        if self.helo_name.is_empty() || self.helo_name.contains(char::is_whitespace) {
            return Err(Error::Config(format!(
                "invalid HELO name: {:?}",
                self.helo_name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SmtpConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 25);
        assert_eq!(config.helo_name, "localhost");
        assert!(config.credentials().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SmtpConfig =
            serde_json::from_str(r#"{"host": "mail.example.org", "port": 1025}"#).unwrap();
        assert_eq!(config.host, "mail.example.org");
        assert_eq!(config.port, 1025);
        assert_eq!(config.helo_name, "localhost");
        assert!(config.username.is_empty());
    }

    #[test]
    fn test_credentials() {
        let config = SmtpConfig::new("localhost", 1025).with_credentials("user", "secret");
        assert_eq!(config.credentials(), Some(("user", "secret")));

        let config = SmtpConfig::new("localhost", 1025).with_credentials("", "secret");
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = SmtpConfig::default().with_credentials("user", "hunter2");
        let debug = format!("{config:?}");
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_validate() {
        assert!(SmtpConfig::new("", 25).validate().is_err());
        assert!(SmtpConfig::new("localhost", 0).validate().is_err());
        assert!(
            SmtpConfig::default()
                .with_helo_name("my host")
                .validate()
                .is_err()
        );
        assert!(
            SmtpConfig::default()
                .with_helo_name("client.example.org")
                .validate()
                .is_ok()
        );
    }
}
