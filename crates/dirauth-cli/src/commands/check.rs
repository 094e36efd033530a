//! check command - verify connectivity and the service account

use super::CommandContext;
use anyhow::Result;
use colored::Colorize;
use dirauth_auth::UidTransformer;
use serde::Serialize;

#[derive(Serialize)]
struct CheckResult<'a> {
    success: bool,
    server_url: &'a str,
    bind_dn: &'a str,
    tls_verify: bool,
}

pub async fn execute(ctx: &CommandContext) -> Result<()> {
    let directory = &ctx.config.directory;

    let mut auth = ctx.connect(UidTransformer).await?;
    let pinged = auth.ping().await;
    let closed = auth.close().await;
    pinged?;
    closed?;

    if ctx.is_json() {
        let result = CheckResult {
            success: true,
            server_url: &directory.url,
            bind_dn: &directory.bind_dn,
            tls_verify: !directory.skip_tls_verify,
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{} Connection successful", "✓".green().bold());
        println!("  {}: {}", "Server".cyan(), directory.url);
        println!("  {}: {}", "Bind DN".cyan(), directory.bind_dn);
        if directory.skip_tls_verify {
            println!("  {}: {}", "TLS".cyan(), "certificate not verified".yellow());
        }
    }

    Ok(())
}
