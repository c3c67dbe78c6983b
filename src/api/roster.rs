//! Roster management

use anyhow::Result;

use super::load_squad;
use super::presence::fit;
use crate::config::Config;
use crate::models::User;

fn user_line(user: &User) -> String {
    format!(
        "{} {} {} {}",
        fit(&user.id, 34),
        fit(&user.name, 24),
        fit(&user.email, 32),
        user.role.as_str()
    )
}

/// List roster members.
pub async fn list_users(config: &Config) -> Result<()> {
    let (_client, squad) = load_squad(config).await?;

    println!("\nMembers:");
    println!("{:-<60}", "");

    if squad.users().is_empty() {
        println!("  (no members)");
        return Ok(());
    }

    for user in squad.users() {
        println!("{}", user_line(user));
    }

    Ok(())
}

/// Register a member and notify the webhook.
pub async fn add_user(config: &Config, name: &str, email: &str) -> Result<()> {
    let (client, mut squad) = load_squad(config).await?;
    let user = squad.add_member(name, email)?;

    if let Err(e) = client.save_user(&user).await {
        tracing::warn!("Save of {} not confirmed by webhook: {:#}", user.email, e);
    }
    println!("Added {} <{}> as {}", user.name, user.email, user.id);
    Ok(())
}

/// Remove a member and notify the webhook.
pub async fn remove_user(config: &Config, id: &str) -> Result<()> {
    let (client, mut squad) = load_squad(config).await?;
    let user = squad.remove_member(id)?;

    if let Err(e) = client.delete_user(&user.id).await {
        tracing::warn!("Delete of {} not confirmed by webhook: {:#}", user.id, e);
    }
    println!("Removed {} <{}>", user.name, user.email);
    Ok(())
}

/// Look a member up by id or email.
pub async fn find_user(config: &Config, query: &str) -> Result<()> {
    let (_client, squad) = load_squad(config).await?;

    match squad.find_user(query) {
        Ok(user) => {
            println!();
            println!("Name:  {}", user.name);
            println!("Email: {}", user.email);
            println!("Role:  {}", user.role.as_str());
            println!("ID:    {}", user.id);
        }
        Err(e) => println!("{}", e),
    }

    Ok(())
}
