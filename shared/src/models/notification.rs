//! In-app notification events

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of in-app notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    RequestCreated,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::RequestCreated => "request_created",
        }
    }
}

/// Emitted after a new item request has been committed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestCreated {
    pub request_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub quantity: i32,
    pub requested_by: Uuid,
}

impl RequestCreated {
    pub fn kind(&self) -> NotificationKind {
        NotificationKind::RequestCreated
    }

    pub fn title(&self) -> String {
        format!("New item request: {}", self.item_name)
    }

    /// Payload stored alongside the notification row
    pub fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "request_id": self.request_id,
            "item_id": self.item_id,
            "quantity": self.quantity,
            "requested_by": self.requested_by,
        })
    }
}
