//! HTTP handlers for in-app notifications

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{
    error::AppResult,
    extract::AppQuery,
    middleware::CurrentUser,
    services::notification::{Notification, NotificationService},
    AppState,
};

/// Query parameters for listing notifications
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub limit: Option<i64>,
}

/// Get the caller's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppQuery(query): AppQuery<ListNotificationsQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let service = NotificationService::new(state.db);
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let notifications = service
        .list_for_user(current_user.0.user_id, limit)
        .await?;
    Ok(Json(notifications))
}
