//! Error types for Dirauth

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Directory Errors
    #[error("Directory connection error: {0}")]
    Connection(String),

    #[error("Bind rejected by directory (rc={rc}): {message}")]
    BindRejected { rc: u32, message: String },

    #[error("Not connected to a directory server")]
    NotConnected,

    // Lookup Errors
    #[error("User {id:?} does not exist or is not unique ({matches} matches)")]
    AmbiguousOrMissingUser { id: String, matches: usize },

    #[error("Directory record has no {0:?} attribute")]
    MissingAttribute(String),

    // Credential Errors
    #[error("Invalid credentials")]
    AuthenticationFailed,

    // Configuration Errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Connection(_) => "ConnectionError",
            Error::BindRejected { .. } => "BindRejected",
            Error::NotConnected => "NotConnected",
            Error::AmbiguousOrMissingUser { .. } => "AmbiguousOrMissingUser",
            Error::MissingAttribute(_) => "MissingAttribute",
            Error::AuthenticationFailed => "AuthenticationFailed",
            Error::InvalidConfig(_) => "InvalidConfig",
            Error::Io(_) => "IoError",
        }
    }

    /// Whether the failure came from the directory being unreachable or
    /// misbehaving, as opposed to the caller's input.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::NotConnected)
    }

    /// Process exit code used by the command-line front end.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::AuthenticationFailed => 1,
            Error::AmbiguousOrMissingUser { .. } | Error::MissingAttribute(_) => 2,
            Error::Connection(_) | Error::BindRejected { .. } | Error::NotConnected => 3,
            Error::InvalidConfig(_) => 4,
            Error::Io(_) => 74,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_password_distinct_from_unreachable() {
        let bad_password = Error::AuthenticationFailed;
        let unreachable = Error::Connection("connection refused".to_string());

        assert!(!bad_password.is_connection_error());
        assert!(unreachable.is_connection_error());
        assert_ne!(bad_password.code(), unreachable.code());
        assert_ne!(bad_password.exit_code(), unreachable.exit_code());
    }

    #[test]
    fn test_ambiguous_user_message() {
        let err = Error::AmbiguousOrMissingUser {
            id: "alice".to_string(),
            matches: 2,
        };

        assert_eq!(err.code(), "AmbiguousOrMissingUser");
        assert_eq!(
            err.to_string(),
            "User \"alice\" does not exist or is not unique (2 matches)"
        );
    }
}
