//! HTTP client for the workflow webhooks
//!
//! Wraps reqwest::Client with the configured endpoints. Fetches return
//! normalized models; mutations only report success or failure.

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};

use crate::config::Config;
use crate::models::{AbsenceRecord, User};
use crate::presence;

/// Client for the roster and absence webhooks.
pub struct WebhookClient {
    http: reqwest::Client,
    config: Config,
}

impl WebhookClient {
    /// Build a client from configuration.
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// GET a webhook and parse its JSON body. An empty body is `null`.
    async fn get_json(&self, url: &str) -> Result<Value> {
        tracing::debug!("Webhook GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Webhook GET {} failed", url))?;
        let resp = check_response(resp, url).await?;

        let body = resp
            .text()
            .await
            .with_context(|| format!("Failed to read body from {}", url))?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).with_context(|| format!("Malformed JSON from {}", url))
    }

    /// POST a JSON body; the response body is ignored.
    async fn post_json(&self, url: &str, body: &Value) -> Result<()> {
        tracing::debug!("Webhook POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Webhook POST {} failed", url))?;

        check_response(resp, url).await?;
        Ok(())
    }

    /// Fetch and normalize the roster.
    pub async fn fetch_users(&self) -> Result<Vec<User>> {
        let body = self.get_json(&self.config.users_url).await?;
        Ok(presence::normalize_users(body))
    }

    /// Fetch and normalize absence requests.
    pub async fn fetch_absences(&self) -> Result<Vec<AbsenceRecord>> {
        let body = self.get_json(&self.config.absences_url).await?;
        Ok(presence::normalize_absences(body, self.config.now()))
    }

    /// Report a decision, sending the whole record in the source schema.
    pub async fn update_absence(&self, record: &AbsenceRecord) -> Result<()> {
        self.post_json(&self.config.update_status_url, &decision_body(record))
            .await
    }

    /// Persist a new roster member.
    pub async fn save_user(&self, user: &User) -> Result<()> {
        let body = json!({ "action": "save", "user": user });
        self.post_json(&self.config.manage_user_url, &body).await
    }

    /// Remove a roster member.
    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        let body = json!({ "action": "delete", "userId": user_id });
        self.post_json(&self.config.manage_user_url, &body).await
    }
}

fn decision_body(record: &AbsenceRecord) -> Value {
    let mut body = presence::source_payload(record);
    body["absenceId"] = json!(record.id);
    body
}

/// Check HTTP response status code and return a clear error on failure.
async fn check_response(resp: reqwest::Response, url: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("HTTP {} for {}: {}", status.as_u16(), url, body.trim());
    }
    Ok(resp)
}
