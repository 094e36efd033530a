//! Bind-search-bind authenticator
//!
//! Every lookup binds as the service account, searches the user subtree for
//! exactly one `organizationalPerson` with the requested `uid`, and leaves
//! the connection bound as the service account again. Authentication adds a
//! bind as the found entry with the supplied password in between.
//!
//! The authenticator owns a single session whose bound identity changes
//! between those steps, so all operations take `&mut self`. Callers sharing
//! one instance across tasks must wrap it in a lock.

use crate::ldap::LdapConnector;
use crate::record::DirectoryRecord;
use crate::session::{DirectoryConnector, DirectorySession, SearchRequest, TlsOptions};
use crate::transformer::Transformer;
use dirauth_core::{DirectoryConfig, Error, Result};
use secrecy::{ExposeSecret, SecretString};
use std::borrow::Cow;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Authenticator talking to a real LDAP server
pub type LdapAuthenticator<T> = Authenticator<LdapConnector, T>;

pub struct Authenticator<C: DirectoryConnector, T> {
    connector: C,
    transformer: T,
    bind_dn: String,
    bind_password: SecretString,
    base_dn: String,
    selectors: Vec<String>,
    tls: TlsOptions,
    escape_filter_values: bool,
    session: Option<C::Session>,
    address: Option<String>,
}

impl<C: DirectoryConnector, T: Transformer> Authenticator<C, T> {
    /// Create an authenticator for the given service account and search base.
    ///
    /// The attributes to fetch are computed here, once, from the
    /// transformer's selectors.
    pub fn new(
        connector: C,
        bind_dn: impl Into<String>,
        bind_password: impl Into<String>,
        base_dn: impl Into<String>,
        transformer: T,
    ) -> Self {
        let selectors = merge_selectors(transformer.selectors());

        Self {
            connector,
            transformer,
            bind_dn: bind_dn.into(),
            bind_password: SecretString::new(bind_password.into()),
            base_dn: base_dn.into(),
            selectors,
            tls: TlsOptions::default(),
            escape_filter_values: true,
            session: None,
            address: None,
        }
    }

    pub fn from_config(connector: C, config: &DirectoryConfig, transformer: T) -> Self {
        Self::new(
            connector,
            config.bind_dn.as_str(),
            config.bind_password.as_str(),
            config.base_dn.as_str(),
            transformer,
        )
        .with_tls(TlsOptions {
            skip_verify: config.skip_tls_verify,
            timeout: Duration::from_secs(config.timeout_seconds),
        })
        .escape_filter_values(config.escape_filter_values)
    }

    pub fn with_tls(mut self, tls: TlsOptions) -> Self {
        self.tls = tls;
        self
    }

    /// Disabling escaping embeds the raw identifier in the search filter,
    /// which lets callers inject filter syntax.
    pub fn escape_filter_values(mut self, escape: bool) -> Self {
        if !escape {
            warn!("LDAP filter escaping disabled, user identifiers are embedded verbatim");
        }
        self.escape_filter_values = escape;
        self
    }

    /// Connect to `address` over an encrypted channel.
    ///
    /// On failure nothing is retained and the authenticator stays
    /// disconnected.
    pub async fn connect(&mut self, address: &str) -> Result<()> {
        if let Some(mut previous) = self.session.take() {
            debug!("Replacing existing connection to {:?}", self.address);
            if let Err(e) = previous.close().await {
                warn!("Failed to close previous connection: {}", e);
            }
            self.address = None;
        }

        let session = self
            .connector
            .connect(address, &self.tls)
            .await
            .map_err(connection_error)?;

        info!("Connected to directory server {}", address);

        self.session = Some(session);
        self.address = Some(address.to_string());
        Ok(())
    }

    /// Release the connection. Does nothing when not connected.
    pub async fn close(&mut self) -> Result<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        info!("Closing connection to directory server {:?}", self.address);
        self.address = None;
        session.close().await.map_err(connection_error)
    }

    /// Check that the service account can still bind.
    pub async fn ping(&mut self) -> Result<()> {
        self.bind_service().await
    }

    /// Verify `password` for `username` and return the user's `uid`.
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<String> {
        let record = self.find_user(username).await?;

        let verified = self.bind_user(&record, password).await;
        self.restore_service_bind(verified).await?;

        info!("Authenticated {}", record.dn());

        record
            .first(dirauth_core::UID_ATTRIBUTE)
            .map(str::to_string)
            .ok_or_else(|| Error::MissingAttribute(dirauth_core::UID_ATTRIBUTE.to_string()))
    }

    /// Look up a user by identifier using only the service account.
    pub async fn fetch_user_by_id(&mut self, id: &str) -> Result<T::User> {
        let record = self.find_user(id).await?;
        Ok(self.transformer.transform(&record))
    }

    /// Search filter selecting the user with identifier `id`
    pub fn user_filter(&self, id: &str) -> String {
        let value = if self.escape_filter_values {
            ldap3::ldap_escape(id)
        } else {
            Cow::Borrowed(id)
        };

        format!(
            "(&(objectClass={})({}={}))",
            dirauth_core::USER_OBJECT_CLASS,
            dirauth_core::UID_ATTRIBUTE,
            value
        )
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Attributes requested by every search
    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }

    pub fn transformer(&self) -> &T {
        &self.transformer
    }

    async fn find_user(&mut self, id: &str) -> Result<DirectoryRecord> {
        self.bind_service().await?;
        let found = self.search_user(id).await;
        self.restore_service_bind(found).await
    }

    async fn bind_service(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or(Error::NotConnected)?;

        debug!("Binding as service account {}", self.bind_dn);

        session
            .bind(&self.bind_dn, self.bind_password.expose_secret())
            .await
            .map_err(|e| match e {
                Error::BindRejected { rc, message } => Error::Connection(format!(
                    "Service account bind failed with code {}: {}",
                    rc, message
                )),
                other => connection_error(other),
            })
    }

    async fn search_user(&mut self, id: &str) -> Result<DirectoryRecord> {
        let request = SearchRequest {
            base: self.base_dn.clone(),
            filter: self.user_filter(id),
            attributes: self.selectors.clone(),
        };

        debug!("Searching for user with filter: {}", request.filter);

        let session = self.session.as_mut().ok_or(Error::NotConnected)?;
        let mut records = session.search(&request).await.map_err(connection_error)?;

        if records.len() != 1 {
            debug!("Expected exactly one entry, found {}", records.len());
            return Err(Error::AmbiguousOrMissingUser {
                id: id.to_string(),
                matches: records.len(),
            });
        }

        Ok(records.swap_remove(0))
    }

    async fn bind_user(&mut self, record: &DirectoryRecord, password: &str) -> Result<()> {
        // An empty simple bind is an unauthenticated bind that servers accept.
        if password.is_empty() {
            warn!("Rejecting empty password for {}", record.dn());
            return Err(Error::AuthenticationFailed);
        }

        let session = self.session.as_mut().ok_or(Error::NotConnected)?;

        debug!("Binding as {}", record.dn());

        session.bind(record.dn(), password).await.map_err(|e| {
            warn!("Bind as {} failed: {}", record.dn(), e);
            Error::AuthenticationFailed
        })
    }

    /// Rebind as the service account, whatever `result` holds.
    ///
    /// If that bind fails the session may still carry an end user's identity,
    /// so it is dropped and the authenticator becomes disconnected.
    async fn restore_service_bind<R>(&mut self, result: Result<R>) -> Result<R> {
        let Some(session) = self.session.as_mut() else {
            return result;
        };

        let restored = session
            .bind(&self.bind_dn, self.bind_password.expose_secret())
            .await;

        let Err(e) = restored else {
            return result;
        };

        error!("Failed to restore service account bind, dropping connection: {}", e);

        if let Some(mut session) = self.session.take() {
            if let Err(close_err) = session.close().await {
                warn!("Failed to close connection after restore failure: {}", close_err);
            }
        }
        self.address = None;

        match result {
            Ok(_) => Err(Error::Connection(format!(
                "Failed to restore service account bind: {}",
                e
            ))),
            Err(original) => Err(original),
        }
    }
}

fn connection_error(e: Error) -> Error {
    match e {
        Error::Connection(_) | Error::NotConnected => e,
        other => Error::Connection(other.to_string()),
    }
}

/// `dn` and `uid` followed by the transformer's selectors, without duplicates.
fn merge_selectors(selectors: Vec<String>) -> Vec<String> {
    let mut merged = vec![
        dirauth_core::DN_ATTRIBUTE.to_string(),
        dirauth_core::UID_ATTRIBUTE.to_string(),
    ];

    for selector in selectors {
        if !merged.iter().any(|s| s.eq_ignore_ascii_case(&selector)) {
            merged.push(selector);
        }
    }

    merged
}
