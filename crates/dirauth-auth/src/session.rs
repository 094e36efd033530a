//! Directory session abstraction
//!
//! The authenticator drives the wire protocol only through these traits.
//! [`crate::ldap::LdapConnector`] is the production implementation.

use crate::record::DirectoryRecord;
use async_trait::async_trait;
use dirauth_core::Result;
use std::time::Duration;

/// Transport security settings applied while connecting
#[derive(Debug, Clone)]
pub struct TlsOptions {
    /// Skip certificate verification during the TLS handshake
    pub skip_verify: bool,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            skip_verify: false,
            timeout: Duration::from_secs(10),
        }
    }
}

/// A subtree search for user records.
///
/// Scope is always the whole subtree, aliases are never dereferenced, no
/// size or time limit is imposed and attribute values are always returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub base: String,
    pub filter: String,
    pub attributes: Vec<String>,
}

/// Establishes encrypted sessions with a directory server.
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    type Session: DirectorySession;

    /// Dial `address` and secure the channel before returning.
    async fn connect(&self, address: &str, tls: &TlsOptions) -> Result<Self::Session>;
}

/// An open directory connection with a currently bound identity.
#[async_trait]
pub trait DirectorySession: Send {
    /// Simple bind. A rejected bind is reported as
    /// [`dirauth_core::Error::BindRejected`], transport failures as
    /// [`dirauth_core::Error::Connection`].
    async fn bind(&mut self, dn: &str, secret: &str) -> Result<()>;

    async fn search(&mut self, request: &SearchRequest) -> Result<Vec<DirectoryRecord>>;

    async fn close(&mut self) -> Result<()>;
}
