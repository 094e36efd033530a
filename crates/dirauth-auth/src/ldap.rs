//! LDAP session backed by `ldap3`
//!
//! `ldap://` URLs are upgraded with STARTTLS before the connection is handed
//! out, `ldaps://` URLs negotiate TLS immediately. Plaintext sessions are
//! never produced.

use crate::record::DirectoryRecord;
use crate::session::{DirectoryConnector, DirectorySession, SearchRequest, TlsOptions};
use async_trait::async_trait;
use dirauth_core::{Error, Result};
use ldap3::{DerefAliases, Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry, SearchOptions};
use tracing::{debug, warn};
use url::Url;

/// Connector producing [`LdapSession`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct LdapConnector;

impl LdapConnector {
    pub fn new() -> Self {
        Self
    }

    fn settings(url: &Url, tls: &TlsOptions) -> Result<LdapConnSettings> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(tls.timeout)
            .set_no_tls_verify(tls.skip_verify);

        match url.scheme() {
            "ldap" => Ok(settings.set_starttls(true)),
            "ldaps" => Ok(settings),
            other => Err(Error::Connection(format!(
                "Unsupported URL scheme {:?}, expected ldap:// or ldaps://",
                other
            ))),
        }
    }
}

#[async_trait]
impl DirectoryConnector for LdapConnector {
    type Session = LdapSession;

    async fn connect(&self, address: &str, tls: &TlsOptions) -> Result<LdapSession> {
        let url = Url::parse(address)
            .map_err(|e| Error::Connection(format!("Invalid server URL {}: {}", address, e)))?;
        let settings = Self::settings(&url, tls)?;

        if tls.skip_verify {
            warn!("TLS certificate verification disabled for {}", address);
        }

        debug!("Connecting to LDAP server: {}", address);

        let (conn, ldap) = LdapConnAsync::from_url_with_settings(settings, &url)
            .await
            .map_err(|e| Error::Connection(format!("Failed to connect to LDAP server: {}", e)))?;

        ldap3::drive!(conn);

        Ok(LdapSession { ldap })
    }
}

/// An encrypted `ldap3` connection
pub struct LdapSession {
    ldap: Ldap,
}

#[async_trait]
impl DirectorySession for LdapSession {
    async fn bind(&mut self, dn: &str, secret: &str) -> Result<()> {
        let result = self
            .ldap
            .simple_bind(dn, secret)
            .await
            .map_err(|e| Error::Connection(format!("Bind failed: {}", e)))?;

        if result.rc != 0 {
            return Err(Error::BindRejected {
                rc: result.rc,
                message: result.text,
            });
        }

        Ok(())
    }

    async fn search(&mut self, request: &SearchRequest) -> Result<Vec<DirectoryRecord>> {
        let options = SearchOptions::new()
            .deref(DerefAliases::Never)
            .sizelimit(0)
            .timelimit(0)
            .typesonly(false);

        let (rs, _res) = self
            .ldap
            .with_search_options(options)
            .search(
                &request.base,
                Scope::Subtree,
                &request.filter,
                request.attributes.clone(),
            )
            .await
            .map_err(|e| Error::Connection(format!("User search failed: {}", e)))?
            .success()
            .map_err(|e| Error::Connection(format!("User search error: {}", e)))?;

        Ok(rs
            .into_iter()
            .map(|entry| DirectoryRecord::from(SearchEntry::construct(entry)))
            .collect())
    }

    async fn close(&mut self) -> Result<()> {
        self.ldap
            .unbind()
            .await
            .map_err(|e| Error::Connection(format!("Unbind failed: {}", e)))
    }
}
