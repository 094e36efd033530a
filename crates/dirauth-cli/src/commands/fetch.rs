//! fetch command - look up a user with the service account

use super::CommandContext;
use anyhow::Result;
use colored::Colorize;
use dirauth_auth::{AttributeMappings, ProfileTransformer};
use tracing::warn;

pub async fn execute(ctx: &CommandContext, id: &str) -> Result<()> {
    let transformer = ProfileTransformer::new(AttributeMappings::from(&ctx.config.attributes));

    let mut auth = ctx.connect(transformer).await?;
    let result = auth.fetch_user_by_id(id).await;

    if let Err(e) = auth.close().await {
        warn!("Failed to close directory connection: {}", e);
    }

    let user = result?;

    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    println!("{}", user.dn.blue().bold());
    println!();
    println!("  {}: {}", "Username".cyan(), user.username);
    println!(
        "  {}: {}",
        "Email".cyan(),
        user.email.as_deref().unwrap_or("-")
    );
    println!(
        "  {}: {}",
        "Display Name".cyan(),
        user.display_name.as_deref().unwrap_or("-")
    );

    let mut extra: Vec<_> = user.attributes.iter().collect();
    extra.sort_by(|a, b| a.0.cmp(b.0));
    for (name, values) in extra {
        println!("  {}: {}", name.cyan(), values.join(", "));
    }

    Ok(())
}
