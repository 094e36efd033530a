//! CLI command implementations

pub mod authenticate;
pub mod check;
pub mod fetch;

use crate::OutputFormat;
use anyhow::Result;
use colored::Colorize;
use dirauth_auth::{LdapAuthenticator, LdapConnector, Transformer};
use dirauth_core::config::DirauthConfig;
use serde::Serialize;
use std::process::ExitCode;

/// Context passed to all commands
pub struct CommandContext {
    pub config: DirauthConfig,
    pub output_format: OutputFormat,
}

#[derive(Serialize)]
struct ErrorResult<'a> {
    error: &'a str,
    message: String,
}

impl CommandContext {
    /// Check if output should be JSON
    pub fn is_json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }

    /// Validate the configuration and open an authenticator on the
    /// configured server.
    pub async fn connect<T: Transformer>(&self, transformer: T) -> Result<LdapAuthenticator<T>> {
        let directory = &self.config.directory;
        directory.validate()?;

        let mut auth = LdapAuthenticator::from_config(LdapConnector::new(), directory, transformer);
        auth.connect(&directory.url).await?;
        Ok(auth)
    }

    /// Report a failed command and pick the exit status.
    pub fn fail(&self, err: &anyhow::Error) -> ExitCode {
        let (code, exit) = match err.downcast_ref::<dirauth_core::Error>() {
            Some(e) => (e.code(), e.exit_code()),
            None => ("InternalError", 70),
        };

        if self.is_json() {
            let result = ErrorResult {
                error: code,
                message: err.to_string(),
            };
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{}", json),
                Err(_) => eprintln!("{}: {}", code, err),
            }
        } else {
            eprintln!("{} {}: {}", "✗".red().bold(), code.red(), err);
        }

        ExitCode::from(exit as u8)
    }
}
