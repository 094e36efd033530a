//! In-memory directory used by the authenticator tests

use crate::record::DirectoryRecord;
use crate::session::{DirectoryConnector, DirectorySession, SearchRequest, TlsOptions};
use async_trait::async_trait;
use dirauth_core::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const INVALID_CREDENTIALS: u32 = 49;

#[derive(Default)]
struct State {
    service: (String, String),
    entries: Vec<(DirectoryRecord, String)>,
    unreachable: bool,
    service_binds_allowed: Option<usize>,
    service_binds: usize,
    bound: Option<String>,
    binds: Vec<String>,
    searches: Vec<SearchRequest>,
    connected_to: Option<String>,
    tls: Option<TlsOptions>,
    closed: bool,
    closes: usize,
}

/// Directory double recording every bind and search it receives.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    state: Arc<Mutex<State>>,
}

impl MemoryDirectory {
    pub fn new(service_dn: &str, service_password: &str) -> Self {
        let directory = Self::default();
        directory.state().service = (service_dn.to_string(), service_password.to_string());
        directory
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Add an `organizationalPerson` entry.
    pub fn with_person(self, dn: &str, uid: &str, password: &str) -> Self {
        self.with_entry(
            dn,
            &[
                ("objectClass", &["top", "person", "organizationalPerson"]),
                ("uid", &[uid]),
            ],
            password,
        )
    }

    pub fn with_entry(self, dn: &str, attrs: &[(&str, &[&str])], password: &str) -> Self {
        let attrs: HashMap<String, Vec<String>> = attrs
            .iter()
            .map(|(name, values)| {
                (
                    name.to_string(),
                    values.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect();
        self.state()
            .entries
            .push((DirectoryRecord::new(dn, attrs), password.to_string()));
        self
    }

    /// Refuse every connection attempt.
    pub fn unreachable(self) -> Self {
        self.state().unreachable = true;
        self
    }

    /// Reject service binds once `count` of them succeeded.
    pub fn allow_service_binds(self, count: usize) -> Self {
        self.state().service_binds_allowed = Some(count);
        self
    }

    pub fn bound_identity(&self) -> Option<String> {
        self.state().bound.clone()
    }

    pub fn binds(&self) -> Vec<String> {
        self.state().binds.clone()
    }

    pub fn last_search(&self) -> Option<SearchRequest> {
        self.state().searches.last().cloned()
    }

    pub fn search_count(&self) -> usize {
        self.state().searches.len()
    }

    pub fn connected_to(&self) -> Option<String> {
        self.state().connected_to.clone()
    }

    pub fn tls(&self) -> Option<TlsOptions> {
        self.state().tls.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// Number of sessions closed so far
    pub fn close_count(&self) -> usize {
        self.state().closes
    }
}

fn filter_uid(filter: &str) -> Option<&str> {
    filter
        .strip_prefix("(&(objectClass=organizationalPerson)(uid=")
        .and_then(|rest| rest.strip_suffix("))"))
}

#[async_trait]
impl DirectoryConnector for MemoryDirectory {
    type Session = MemorySession;

    async fn connect(&self, address: &str, tls: &TlsOptions) -> Result<MemorySession> {
        let mut state = self.state();
        if state.unreachable {
            return Err(Error::Connection(format!(
                "Failed to connect to LDAP server: {} unreachable",
                address
            )));
        }

        state.connected_to = Some(address.to_string());
        state.tls = Some(tls.clone());
        state.closed = false;
        state.bound = None;

        Ok(MemorySession {
            directory: self.clone(),
        })
    }
}

pub struct MemorySession {
    directory: MemoryDirectory,
}

#[async_trait]
impl DirectorySession for MemorySession {
    async fn bind(&mut self, dn: &str, secret: &str) -> Result<()> {
        let mut state = self.directory.state();
        state.binds.push(dn.to_string());

        let accepted = if state.service.0 == dn {
            let allowed = state
                .service_binds_allowed
                .map_or(true, |limit| state.service_binds < limit);
            let ok = allowed && state.service.1 == secret;
            if ok {
                state.service_binds += 1;
            }
            ok
        } else {
            state
                .entries
                .iter()
                .any(|(record, password)| record.dn() == dn && password == secret)
        };

        if accepted {
            state.bound = Some(dn.to_string());
            Ok(())
        } else {
            state.bound = None;
            Err(Error::BindRejected {
                rc: INVALID_CREDENTIALS,
                message: "invalid credentials".to_string(),
            })
        }
    }

    async fn search(&mut self, request: &SearchRequest) -> Result<Vec<DirectoryRecord>> {
        let mut state = self.directory.state();
        state.searches.push(request.clone());

        if state.bound.is_none() {
            return Err(Error::Connection("Anonymous search refused".to_string()));
        }

        let uid = filter_uid(&request.filter)
            .ok_or_else(|| Error::Connection(format!("Unsupported filter {}", request.filter)))?;
        let suffix = format!(",{}", request.base.to_ascii_lowercase());

        Ok(state
            .entries
            .iter()
            .map(|(record, _)| record)
            .filter(|record| {
                let dn = record.dn().to_ascii_lowercase();
                dn == request.base.to_ascii_lowercase() || dn.ends_with(&suffix)
            })
            .filter(|record| {
                record
                    .values("objectClass")
                    .iter()
                    .any(|class| class == dirauth_core::USER_OBJECT_CLASS)
            })
            .filter(|record| {
                record
                    .values("uid")
                    .iter()
                    .any(|value| value == uid || ldap3::ldap_escape(value.as_str()) == uid)
            })
            .cloned()
            .collect())
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.directory.state();
        state.closed = true;
        state.closes += 1;
        state.bound = None;
        Ok(())
    }
}
