//! Dirauth Core Library
//!
//! Error types and configuration shared by the directory authenticator and
//! its command-line front end.

pub mod config;
pub mod error;

pub use config::{AttributesConfig, DirauthConfig, DirectoryConfig, LoggingConfig};
pub use error::{Error, Result};

/// Dirauth version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Object class every user record must carry
pub const USER_OBJECT_CLASS: &str = "organizationalPerson";

/// Attribute holding the user identifier
pub const UID_ATTRIBUTE: &str = "uid";

/// Pseudo-attribute requesting the distinguished name
pub const DN_ATTRIBUTE: &str = "dn";
