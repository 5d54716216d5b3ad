//! CLI command handlers for login, status, refresh, and logout.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::{AuthService, FileStore};
use crate::config::{get_config, GleanConfig};

use super::LoginArgs;

fn service_and_config() -> Result<(AuthService, GleanConfig), Box<dyn std::error::Error>> {
    let store = Arc::new(FileStore::new_default());
    let config = get_config(store.as_ref())?;
    let service = AuthService::new(store.clone(), store);
    Ok((service, config))
}

/// Handle `glean-auth login`.
pub async fn handle_login(args: &LoginArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (service, config) = service_and_config()?;
    if config.is_token() {
        println!("✅ Using a Glean API token; no login needed.");
        return Ok(());
    }

    let config = service.upgrade_config_to_oauth(config).await?;
    service.force_authorize(&config).await?;
    println!("✅ Login successful!");

    if args.mirror {
        service.write_proxy_mirror(&config, None)?;
        println!("   Mirrored credentials for the proxy tool.");
    }
    Ok(())
}

/// Handle `glean-auth status`.
pub async fn handle_status() -> Result<(), Box<dyn std::error::Error>> {
    let (service, config) = service_and_config()?;
    if config.is_token() {
        println!("✅ Configured with a Glean API token.");
        return Ok(());
    }
    match service.status(&config)? {
        None => println!("❌ Not logged in ({})", config.base_url()),
        Some(token) if token.is_expired() => {
            println!("⚠️  Token expired ({})", config.base_url());
            if token.refresh_token.is_some() {
                println!("   A refresh token is available; run `glean-auth refresh`.");
            }
        }
        Some(token) => match token.expires_at {
            Some(expires_at) => {
                let remaining = expires_at - Utc::now();
                println!(
                    "✅ Logged in ({}), expires in {}m",
                    config.base_url(),
                    remaining.num_minutes().max(0)
                );
            }
            None => println!("✅ Logged in ({})", config.base_url()),
        },
    }
    Ok(())
}

/// Handle `glean-auth refresh`.
pub async fn handle_refresh() -> Result<(), Box<dyn std::error::Error>> {
    let (service, config) = service_and_config()?;
    service.force_refresh_tokens(&config).await?;
    println!("✅ Tokens refreshed.");
    Ok(())
}

/// Handle `glean-auth logout`.
pub async fn handle_logout() -> Result<(), Box<dyn std::error::Error>> {
    let (service, config) = service_and_config()?;
    service.logout(&config)?;
    println!("✅ Logged out ({})", config.base_url());
    Ok(())
}
