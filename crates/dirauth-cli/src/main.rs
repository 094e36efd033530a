//! Dirauth - directory authentication from the command line
//!
//! Verifies credentials and looks up users in an LDAP directory using the
//! bind-search-bind protocol.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use commands::CommandContext;
use dirauth_core::config::DirauthConfig;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dirauth")]
#[command(author = "Dirauth Team")]
#[command(version = dirauth_core::VERSION)]
#[command(about = "Authenticate users against an LDAP directory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DIRAUTH_CONFIG")]
    config: Option<String>,

    /// Directory server URL (ldap:// or ldaps://)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Service account DN
    #[arg(long, global = true)]
    bind_dn: Option<String>,

    /// Service account password
    #[arg(long, global = true)]
    bind_password: Option<String>,

    /// Base DN for user searches
    #[arg(long, global = true)]
    base_dn: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    insecure_skip_verify: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a user's password and print their uid
    Authenticate {
        /// User identifier (uid)
        #[arg(short, long)]
        username: String,

        /// Password; read from stdin when omitted
        #[arg(short, long, env = "DIRAUTH_USER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Look up a user by identifier
    Fetch {
        /// User identifier (uid)
        id: String,
    },

    /// Connect and bind as the service account
    Check,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", e.code(), e);
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    init_logging(&config);

    let ctx = CommandContext {
        config,
        output_format: cli.output,
    };

    let result = match cli.command {
        Commands::Authenticate { username, password } => {
            commands::authenticate::execute(&ctx, &username, password).await
        }
        Commands::Fetch { id } => commands::fetch::execute(&ctx, &id).await,
        Commands::Check => commands::check::execute(&ctx).await,
        Commands::Version => {
            println!("dirauth {}", dirauth_core::VERSION);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => ctx.fail(&e),
    }
}

/// File (or environment) configuration with command-line overrides applied.
fn load_config(cli: &Cli) -> dirauth_core::Result<DirauthConfig> {
    let mut config = if let Some(config_path) = &cli.config {
        let mut config = DirauthConfig::from_file(config_path)?;
        config.apply_env()?;
        config
    } else {
        DirauthConfig::from_env()?
    };

    if let Some(url) = &cli.url {
        config.directory.url = url.clone();
    }
    if let Some(bind_dn) = &cli.bind_dn {
        config.directory.bind_dn = bind_dn.clone();
    }
    if let Some(bind_password) = &cli.bind_password {
        config.directory.bind_password = bind_password.clone();
    }
    if let Some(base_dn) = &cli.base_dn {
        config.directory.base_dn = base_dn.clone();
    }
    if cli.insecure_skip_verify {
        config.directory.skip_tls_verify = true;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    Ok(config)
}

fn init_logging(config: &DirauthConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }

    debug!("Logging initialized at level {}", config.logging.level);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_applied() {
        let cli = Cli::try_parse_from([
            "dirauth",
            "--url",
            "ldaps://ldap.example.com:636",
            "--bind-dn",
            "cn=svc,dc=example,dc=com",
            "--base-dn",
            "ou=people,dc=example,dc=com",
            "--insecure-skip-verify",
            "--log-level",
            "debug",
            "fetch",
            "alice",
        ])
        .unwrap();

        let config = load_config(&cli).unwrap();
        assert_eq!(config.directory.url, "ldaps://ldap.example.com:636");
        assert_eq!(config.directory.bind_dn, "cn=svc,dc=example,dc=com");
        assert_eq!(config.directory.base_dn, "ou=people,dc=example,dc=com");
        assert!(config.directory.skip_tls_verify);
        assert_eq!(config.logging.level, "debug");
        assert!(matches!(cli.command, Commands::Fetch { ref id } if id == "alice"));
    }

    #[test]
    fn test_unreadable_config_file() {
        let cli =
            Cli::try_parse_from(["dirauth", "--config", "/nonexistent/dirauth.toml", "check"])
                .unwrap();

        let err = load_config(&cli).unwrap_err();
        assert_eq!(err.code(), "IoError");
        assert_eq!(err.exit_code(), 74);
    }

    #[test]
    fn test_authenticate_arguments() {
        let cli = Cli::try_parse_from([
            "dirauth",
            "--output",
            "json",
            "authenticate",
            "--username",
            "alice",
            "--password",
            "correct",
        ])
        .unwrap();

        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::Authenticate { username, password } => {
                assert_eq!(username, "alice");
                assert_eq!(password.as_deref(), Some("correct"));
            }
            _ => panic!("expected authenticate"),
        }
    }
}
