//! Webhook API client and the CLI commands built on it

mod absences;
pub mod client;
mod presence;
mod roster;

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::models::AbsenceStatus;
use crate::report;
use crate::store::{LoadState, Squad};
use client::WebhookClient;

/// Fetch roster and absences concurrently into `squad`.
///
/// Failures are logged and leave the previous snapshot in place.
pub async fn reload(client: &WebhookClient, squad: &mut Squad) -> LoadState {
    squad.begin_load();
    let (users, absences) = tokio::join!(client.fetch_users(), client.fetch_absences());
    squad.finish_load(users, absences).clone()
}

/// Build a client and load a fresh snapshot.
async fn load_squad(config: &Config) -> Result<(WebhookClient, Squad)> {
    let client = WebhookClient::new(config.clone())?;
    let mut squad = Squad::new();
    if let LoadState::Failed { message } = reload(&client, &mut squad).await {
        tracing::warn!("Showing partial data: {}", message);
    }
    Ok((client, squad))
}

/// Show who is online
pub async fn show_status(config: &Config, json: bool) -> Result<()> {
    presence::show_status(config, json).await
}

/// Show headline counts
pub async fn show_summary(config: &Config, json: bool) -> Result<()> {
    presence::show_summary(config, json).await
}

/// List pending requests
pub async fn list_pending(config: &Config) -> Result<()> {
    absences::list_pending(config).await
}

/// List decided requests
pub async fn list_history(config: &Config) -> Result<()> {
    absences::list_history(config).await
}

/// Approve a pending request
pub async fn approve(config: &Config, id: &str) -> Result<()> {
    absences::decide(config, id, AbsenceStatus::Approved).await
}

/// Reject a pending request
pub async fn reject(config: &Config, id: &str) -> Result<()> {
    absences::decide(config, id, AbsenceStatus::Rejected).await
}

/// List roster members
pub async fn list_users(config: &Config) -> Result<()> {
    roster::list_users(config).await
}

/// Add a roster member
pub async fn add_user(config: &Config, name: &str, email: &str) -> Result<()> {
    roster::add_user(config, name, email).await
}

/// Remove a roster member
pub async fn remove_user(config: &Config, id: &str) -> Result<()> {
    roster::remove_user(config, id).await
}

/// Find a roster member by id or email
pub async fn find_user(config: &Config, query: &str) -> Result<()> {
    roster::find_user(config, query).await
}

/// Write the monthly CSV report into `dir`
pub async fn export(config: &Config, dir: &Path) -> Result<()> {
    let (_client, squad) = load_squad(config).await?;
    let path = report::write_report(squad.absences(), dir, config.now())?;
    println!("Report written to {}", path.display());
    Ok(())
}
