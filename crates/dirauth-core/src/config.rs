//! Configuration for Dirauth
//!
//! Example `dirauth.toml`:
//! ```toml
//! [directory]
//! url = "ldap://ldap.example.com:389"
//! bind_dn = "cn=svc,dc=example,dc=com"
//! bind_password = "svcpw"
//! base_dn = "ou=people,dc=example,dc=com"
//!
//! [attributes]
//! username = "uid"
//! email = "mail"
//! display_name = "cn"
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirauthConfig {
    #[serde(default)]
    pub directory: DirectoryConfig,

    #[serde(default)]
    pub attributes: AttributesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DirauthConfig {
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::InvalidConfig(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> crate::Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay `DIRAUTH_*` environment variables onto this configuration.
    pub fn apply_env(&mut self) -> crate::Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> crate::Result<()> {
        if let Some(url) = var("DIRAUTH_URL") {
            self.directory.url = url;
        }
        if let Some(dn) = var("DIRAUTH_BIND_DN") {
            self.directory.bind_dn = dn;
        }
        if let Some(password) = var("DIRAUTH_BIND_PASSWORD") {
            self.directory.bind_password = password;
        }
        if let Some(base) = var("DIRAUTH_BASE_DN") {
            self.directory.base_dn = base;
        }
        if let Some(flag) = var("DIRAUTH_SKIP_TLS_VERIFY") {
            self.directory.skip_tls_verify = parse_flag(&flag);
        }
        if let Some(flag) = var("DIRAUTH_ESCAPE_FILTER_VALUES") {
            self.directory.escape_filter_values = parse_flag(&flag);
        }
        if let Some(timeout) = var("DIRAUTH_TIMEOUT_SECONDS") {
            self.directory.timeout_seconds = timeout.parse().map_err(|_| {
                crate::Error::InvalidConfig(format!(
                    "DIRAUTH_TIMEOUT_SECONDS must be a whole number of seconds, got {:?}",
                    timeout
                ))
            })?;
        }
        if let Some(level) = var("DIRAUTH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("DIRAUTH_LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        self.directory.validate()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Directory server connection and service identity
#[derive(Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Server URL (ldap:// upgraded with STARTTLS, or ldaps://)
    #[serde(default = "default_url")]
    pub url: String,

    /// Service account DN used for searches
    #[serde(default)]
    pub bind_dn: String,

    /// Service account password, never serialized
    #[serde(default, skip_serializing)]
    pub bind_password: String,

    /// Base DN for user searches
    #[serde(default)]
    pub base_dn: String,

    /// Skip TLS certificate verification (not recommended for production)
    #[serde(default)]
    pub skip_tls_verify: bool,

    /// Escape the user identifier before embedding it in the search filter
    #[serde(default = "default_true")]
    pub escape_filter_values: bool,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_url() -> String {
    "ldap://localhost:389".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    10
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            bind_dn: String::new(),
            bind_password: String::new(),
            base_dn: String::new(),
            skip_tls_verify: false,
            escape_filter_values: true,
            timeout_seconds: default_timeout(),
        }
    }
}

impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("url", &self.url)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &"[REDACTED]")
            .field("base_dn", &self.base_dn)
            .field("skip_tls_verify", &self.skip_tls_verify)
            .field("escape_filter_values", &self.escape_filter_values)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl DirectoryConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.url.is_empty() {
            return Err(crate::Error::InvalidConfig("Server URL is required".to_string()));
        }

        let url = Url::parse(&self.url)
            .map_err(|e| crate::Error::InvalidConfig(format!("Invalid server URL: {}", e)))?;

        if url.scheme() != "ldap" && url.scheme() != "ldaps" {
            return Err(crate::Error::InvalidConfig(
                "Server URL must start with ldap:// or ldaps://".to_string(),
            ));
        }

        if self.bind_dn.is_empty() {
            return Err(crate::Error::InvalidConfig("Bind DN is required".to_string()));
        }

        if self.base_dn.is_empty() {
            return Err(crate::Error::InvalidConfig("Base DN is required".to_string()));
        }

        if self.timeout_seconds == 0 {
            return Err(crate::Error::InvalidConfig(
                "Connection timeout must be at least one second".to_string(),
            ));
        }

        Ok(())
    }
}

/// Attribute names used when mapping a record to a user profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributesConfig {
    #[serde(default = "default_username_attr")]
    pub username: String,

    #[serde(default = "default_email_attr")]
    pub email: String,

    #[serde(default = "default_display_name_attr")]
    pub display_name: String,

    /// Additional attributes copied verbatim into the profile
    #[serde(default)]
    pub extra: Vec<String>,
}

fn default_username_attr() -> String {
    "uid".to_string()
}

fn default_email_attr() -> String {
    "mail".to_string()
}

fn default_display_name_attr() -> String {
    "cn".to_string()
}

impl Default for AttributesConfig {
    fn default() -> Self {
        Self {
            username: default_username_attr(),
            email: default_email_attr(),
            display_name: default_display_name_attr(),
            extra: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
