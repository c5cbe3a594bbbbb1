//! In-app notifications for approvers
//!
//! Request creation emits a [`RequestCreated`] event after its row is
//! committed. The event goes through a bounded channel to a dispatcher task
//! that writes one notification row per approver account. Neither a full
//! channel nor a failed insert is ever reported back to the requester.

use serde::Serialize;
use shared::{Capability, RequestCreated, Role};
use sqlx::{FromRow, PgPool};
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::error::AppResult;

/// Sending half of the notification channel, cloned into every handler
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: mpsc::Sender<RequestCreated>,
}

impl Notifier {
    /// Create a notifier and the receiver its dispatcher should drain
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<RequestCreated>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Queue an event without waiting. Returns whether it was accepted.
    pub fn request_created(&self, event: RequestCreated) -> bool {
        let request_id = event.request_id;
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(%request_id, "Notification queue full, dropping event");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(%request_id, "Notification dispatcher stopped, dropping event");
                false
            }
        }
    }
}

/// Stored in-app notification
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub payload: serde_json::Value,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Writes notification rows
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
}

impl NotificationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Role names allowed to decide requests
    fn approver_roles() -> Vec<String> {
        Role::holders(Capability::DecideRequests)
            .into_iter()
            .map(|r| r.as_str().to_string())
            .collect()
    }

    /// Insert a notification for every approver. Returns the number written.
    pub async fn notify_approvers(&self, event: &RequestCreated) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (user_id, kind, title, payload)
            SELECT id, $2, $3, $4 FROM users WHERE role = ANY($1)
            "#,
        )
        .bind(Self::approver_roles())
        .bind(event.kind().as_str())
        .bind(event.title())
        .bind(event.payload())
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }

    /// Most recent notifications addressed to a user
    pub async fn list_for_user(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, kind, title, payload, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}

/// Drain the channel until every [`Notifier`] has been dropped
pub async fn run_dispatcher(service: NotificationService, mut receiver: mpsc::Receiver<RequestCreated>) {
    tracing::info!("Starting notification dispatcher");

    while let Some(event) = receiver.recv().await {
        match service.notify_approvers(&event).await {
            Ok(count) => tracing::debug!(
                request_id = %event.request_id,
                "Notified {} approver(s) of new request",
                count
            ),
            Err(e) => tracing::error!(
                request_id = %event.request_id,
                "Failed to notify approvers: {}",
                e
            ),
        }
    }

    tracing::info!("Notification dispatcher stopped");
}
