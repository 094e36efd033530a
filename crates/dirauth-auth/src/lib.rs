//! Directory authentication for Dirauth
//!
//! Provides bind-search-bind authentication against an LDAP directory:
//! - service account lookup of a user by `uid`
//! - password verification by binding as the found entry
//! - pluggable mapping of directory records to application users

pub mod authenticator;
pub mod ldap;
pub mod record;
pub mod session;
pub mod transformer;

#[cfg(test)]
mod memory;

pub use authenticator::{Authenticator, LdapAuthenticator};
pub use ldap::{LdapConnector, LdapSession};
pub use record::DirectoryRecord;
pub use session::{DirectoryConnector, DirectorySession, SearchRequest, TlsOptions};
pub use transformer::{
    AttributeMappings, DirectoryUser, ProfileTransformer, RawTransformer, Transformer,
    UidTransformer,
};
