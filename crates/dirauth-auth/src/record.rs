//! Directory records as returned by a user search

use ldap3::SearchEntry;
use serde::Serialize;
use std::collections::HashMap;

/// A single entry returned by the directory: its distinguished name plus
/// named, multi-valued string attributes.
///
/// Attribute names are matched exactly first and then ASCII
/// case-insensitively, since directory servers may return them in a
/// different case than requested. No ordering of values is guaranteed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryRecord {
    dn: String,
    attrs: HashMap<String, Vec<String>>,
}

impl DirectoryRecord {
    pub fn new(dn: impl Into<String>, attrs: HashMap<String, Vec<String>>) -> Self {
        Self {
            dn: dn.into(),
            attrs,
        }
    }

    /// Distinguished name of the entry
    pub fn dn(&self) -> &str {
        &self.dn
    }

    /// All values of an attribute, empty if absent
    pub fn values(&self, name: &str) -> &[String] {
        self.lookup(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First value of an attribute
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn attributes(&self) -> &HashMap<String, Vec<String>> {
        &self.attrs
    }

    fn lookup(&self, name: &str) -> Option<&Vec<String>> {
        self.attrs.get(name).or_else(|| {
            self.attrs
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, values)| values)
        })
    }
}

impl From<SearchEntry> for DirectoryRecord {
    fn from(entry: SearchEntry) -> Self {
        Self::new(entry.dn, entry.attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> DirectoryRecord {
        let mut attrs = HashMap::new();
        attrs.insert("uid".to_string(), vec!["alice".to_string()]);
        attrs.insert(
            "mail".to_string(),
            vec!["alice@example.com".to_string(), "a@example.com".to_string()],
        );
        attrs.insert("displayName".to_string(), vec!["Alice Liddell".to_string()]);
        DirectoryRecord::new("uid=alice,ou=people,dc=example,dc=com", attrs)
    }

    #[test]
    fn test_attribute_lookup() {
        let record = alice();

        assert_eq!(record.dn(), "uid=alice,ou=people,dc=example,dc=com");
        assert_eq!(record.first("uid"), Some("alice"));
        assert_eq!(record.values("mail").len(), 2);
        assert!(record.first("telephoneNumber").is_none());
        assert!(record.values("telephoneNumber").is_empty());
    }

    #[test]
    fn test_case_insensitive_names() {
        let record = alice();

        assert_eq!(record.first("UID"), Some("alice"));
        assert_eq!(record.first("displayname"), Some("Alice Liddell"));
        assert!(record.has_attribute("MAIL"));
    }

    #[test]
    fn test_from_search_entry() {
        let mut attrs = HashMap::new();
        attrs.insert("uid".to_string(), vec!["bob".to_string()]);
        let entry = SearchEntry {
            dn: "uid=bob,ou=people,dc=example,dc=com".to_string(),
            attrs,
            bin_attrs: HashMap::new(),
        };

        let record = DirectoryRecord::from(entry);
        assert_eq!(record.dn(), "uid=bob,ou=people,dc=example,dc=com");
        assert_eq!(record.first("uid"), Some("bob"));
    }
}
