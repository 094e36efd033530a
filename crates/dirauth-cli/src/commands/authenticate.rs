//! authenticate command - verify a password and print the uid

use super::CommandContext;
use anyhow::{Context, Result};
use colored::Colorize;
use dirauth_auth::UidTransformer;
use serde::Serialize;
use std::io::BufRead;
use tracing::warn;

#[derive(Serialize)]
struct AuthenticateResult {
    authenticated: bool,
    uid: String,
}

pub async fn execute(ctx: &CommandContext, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };

    let mut auth = ctx.connect(UidTransformer).await?;
    let result = auth.authenticate(username, &password).await;

    if let Err(e) = auth.close().await {
        warn!("Failed to close directory connection: {}", e);
    }

    let uid = result?;

    if ctx.is_json() {
        let result = AuthenticateResult {
            authenticated: true,
            uid,
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{} {}", "✓".green().bold(), uid);
    }

    Ok(())
}

/// First line of stdin without its line terminator
fn read_password() -> Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
