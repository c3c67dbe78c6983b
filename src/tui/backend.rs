//! Async backend: bridges the TUI event loop with webhook calls.
//!
//! Uses an mpsc channel pair. The TUI sends `BackendCommand` values, and a
//! background tokio task executes them and sends `BackendResponse` values back.
//! Commands run concurrently; overlapping reloads are not deduplicated, so the
//! last one to finish wins.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::api::client::WebhookClient;
use crate::models::{AbsenceRecord, User};

/// Commands sent from the TUI event loop to the async backend.
#[derive(Debug)]
pub enum BackendCommand {
    /// Fetch roster and absences.
    Reload,
    /// Report an approve/reject decision already applied locally.
    Decide(AbsenceRecord),
    /// Persist a member already added locally.
    SaveUser(User),
    /// Delete a member already removed locally.
    DeleteUser(String),
}

/// Responses from the async backend to the TUI.
pub enum BackendResponse {
    Snapshot {
        users: Result<Vec<User>>,
        absences: Result<Vec<AbsenceRecord>>,
    },
    /// Outcome of a fire-and-forget mutation.
    Confirmed { action: String, result: Result<()> },
}

/// Handle for interacting with the backend from the TUI side.
pub struct Backend {
    cmd_tx: mpsc::UnboundedSender<BackendCommand>,
    resp_rx: mpsc::UnboundedReceiver<BackendResponse>,
}

impl Backend {
    /// Start the backend. Spawns a tokio task that processes commands.
    pub fn start(client: WebhookClient) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (resp_tx, resp_rx) = mpsc::unbounded_channel();

        tokio::spawn(backend_loop(Arc::new(client), cmd_rx, resp_tx));

        Self { cmd_tx, resp_rx }
    }

    /// Send a command to the backend (non-blocking).
    pub fn send(&self, cmd: BackendCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::error!("Backend channel closed -- command dropped");
        }
    }

    /// Receive a response from the backend.
    ///
    /// Returns `None` only when the backend task has exited.
    pub async fn recv(&mut self) -> Option<BackendResponse> {
        self.resp_rx.recv().await
    }
}

async fn backend_loop(
    client: Arc<WebhookClient>,
    mut cmd_rx: mpsc::UnboundedReceiver<BackendCommand>,
    resp_tx: mpsc::UnboundedSender<BackendResponse>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        let client = Arc::clone(&client);
        let resp_tx = resp_tx.clone();

        // Spawn each command as a separate task so we don't block the loop.
        tokio::spawn(async move {
            let response = execute(&client, cmd).await;
            let _ = resp_tx.send(response);
        });
    }
}

async fn execute(client: &WebhookClient, cmd: BackendCommand) -> BackendResponse {
    match cmd {
        BackendCommand::Reload => {
            let (users, absences) = tokio::join!(client.fetch_users(), client.fetch_absences());
            BackendResponse::Snapshot { users, absences }
        }
        BackendCommand::Decide(record) => BackendResponse::Confirmed {
            action: format!("{} {}", record.status, record.id),
            result: client.update_absence(&record).await,
        },
        BackendCommand::SaveUser(user) => BackendResponse::Confirmed {
            action: format!("save {}", user.email),
            result: client.save_user(&user).await,
        },
        BackendCommand::DeleteUser(id) => BackendResponse::Confirmed {
            action: format!("delete {}", id),
            result: client.delete_user(&id).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn unreachable_client() -> WebhookClient {
        let config = Config {
            users_url: "http://127.0.0.1:9/users".into(),
            absences_url: "http://127.0.0.1:9/absences".into(),
            update_status_url: "http://127.0.0.1:9/status".into(),
            manage_user_url: "http://127.0.0.1:9/users/manage".into(),
            request_timeout_secs: 2,
            ..Config::default()
        };
        WebhookClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_unreachable_reload_reports_errors() {
        let mut backend = Backend::start(unreachable_client());
        backend.send(BackendCommand::Reload);

        match backend.recv().await {
            Some(BackendResponse::Snapshot { users, absences }) => {
                assert!(users.is_err());
                assert!(absences.is_err());
            }
            _ => panic!("expected a snapshot response"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_delete_is_unconfirmed() {
        let mut backend = Backend::start(unreachable_client());
        backend.send(BackendCommand::DeleteUser("u1".into()));

        match backend.recv().await {
            Some(BackendResponse::Confirmed { action, result }) => {
                assert_eq!(action, "delete u1");
                assert!(result.is_err());
            }
            _ => panic!("expected a confirmation response"),
        }
    }
}
