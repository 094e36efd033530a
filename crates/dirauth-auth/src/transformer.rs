//! Record transformers
//!
//! A [`Transformer`] turns the raw [`DirectoryRecord`] found for a user into
//! the value the application works with, and declares which attributes the
//! search has to fetch for that.

use crate::record::DirectoryRecord;
use dirauth_core::AttributesConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maps a directory record to an application user value.
///
/// Implementations must be pure: no I/O and no reliance on the order of
/// multi-valued attributes.
pub trait Transformer: Send + Sync {
    type User;

    /// Attributes the search must request for [`Transformer::transform`].
    fn selectors(&self) -> Vec<String>;

    fn transform(&self, record: &DirectoryRecord) -> Self::User;
}

/// Returns the record's `uid`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UidTransformer;

impl Transformer for UidTransformer {
    type User = Option<String>;

    fn selectors(&self) -> Vec<String> {
        vec![dirauth_core::UID_ATTRIBUTE.to_string()]
    }

    fn transform(&self, record: &DirectoryRecord) -> Option<String> {
        record.first(dirauth_core::UID_ATTRIBUTE).map(str::to_string)
    }
}

/// Copies a fixed set of attributes out of the record.
#[derive(Debug, Clone, Default)]
pub struct RawTransformer {
    attributes: Vec<String>,
}

impl RawTransformer {
    pub fn new<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }
}

impl Transformer for RawTransformer {
    type User = HashMap<String, Vec<String>>;

    fn selectors(&self) -> Vec<String> {
        self.attributes.clone()
    }

    fn transform(&self, record: &DirectoryRecord) -> Self::User {
        self.attributes
            .iter()
            .filter(|name| record.has_attribute(name))
            .map(|name| (name.clone(), record.values(name).to_vec()))
            .collect()
    }
}

/// Attribute names used by [`ProfileTransformer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMappings {
    pub username: String,
    pub email: String,
    pub display_name: String,
    /// Additional attributes copied verbatim
    pub extra: Vec<String>,
}

impl Default for AttributeMappings {
    fn default() -> Self {
        Self::from(&AttributesConfig::default())
    }
}

impl AttributeMappings {
    /// Active Directory default mappings
    pub fn active_directory() -> Self {
        Self {
            username: "sAMAccountName".to_string(),
            email: "mail".to_string(),
            display_name: "displayName".to_string(),
            extra: Vec::new(),
        }
    }

    /// OpenLDAP default mappings
    pub fn openldap() -> Self {
        Self {
            username: "uid".to_string(),
            email: "mail".to_string(),
            display_name: "cn".to_string(),
            extra: Vec::new(),
        }
    }
}

impl From<&AttributesConfig> for AttributeMappings {
    fn from(config: &AttributesConfig) -> Self {
        Self {
            username: config.username.clone(),
            email: config.email.clone(),
            display_name: config.display_name.clone(),
            extra: config.extra.clone(),
        }
    }
}

/// Application-level view of a directory user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    /// User DN (Distinguished Name)
    pub dn: String,

    pub username: String,

    pub email: Option<String>,

    pub display_name: Option<String>,

    /// Values of the configured extra attributes
    #[serde(default)]
    pub attributes: HashMap<String, Vec<String>>,
}

impl DirectoryUser {
    /// Get first value of an extra attribute
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|v| v.first())
            .map(|s| s.as_str())
    }
}

/// Builds a [`DirectoryUser`] from configurable attribute names.
#[derive(Debug, Clone, Default)]
pub struct ProfileTransformer {
    mappings: AttributeMappings,
}

impl ProfileTransformer {
    pub fn new(mappings: AttributeMappings) -> Self {
        Self { mappings }
    }

    pub fn mappings(&self) -> &AttributeMappings {
        &self.mappings
    }
}

impl Transformer for ProfileTransformer {
    type User = DirectoryUser;

    fn selectors(&self) -> Vec<String> {
        let mut selectors = vec![
            self.mappings.username.clone(),
            self.mappings.email.clone(),
            self.mappings.display_name.clone(),
        ];
        selectors.extend(self.mappings.extra.iter().cloned());
        selectors
    }

    fn transform(&self, record: &DirectoryRecord) -> DirectoryUser {
        let attributes = self
            .mappings
            .extra
            .iter()
            .filter(|name| record.has_attribute(name))
            .map(|name| (name.clone(), record.values(name).to_vec()))
            .collect();

        DirectoryUser {
            dn: record.dn().to_string(),
            username: record
                .first(&self.mappings.username)
                .or_else(|| record.first(dirauth_core::UID_ATTRIBUTE))
                .unwrap_or_default()
                .to_string(),
            email: record.first(&self.mappings.email).map(str::to_string),
            display_name: record.first(&self.mappings.display_name).map(str::to_string),
            attributes,
        }
    }
}
