//! HTTP handlers for inbound movements

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use shared::{InboundMovement, ListQuery, PaginatedResponse};
use uuid::Uuid;

use crate::{
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    middleware::CurrentUser,
    services::inbound::{
        CreateInboundInput, InboundService, RejectInboundInput, UpdateInboundInput,
    },
    AppState,
};

/// Record a receipt
pub async fn create_inbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<CreateInboundInput>,
) -> AppResult<impl IntoResponse> {
    let service = InboundService::new(state.db);
    let movement = service.create_movement(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// List receipts
pub async fn list_inbound(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<InboundMovement>>> {
    let service = InboundService::new(state.db);
    let movements = service.list_movements(&query.pagination()).await?;
    Ok(Json(movements))
}

/// Edit a pending receipt
pub async fn update_inbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(movement_id): AppPath<Uuid>,
    AppJson(input): AppJson<UpdateInboundInput>,
) -> AppResult<Json<InboundMovement>> {
    let service = InboundService::new(state.db);
    let movement = service
        .update_movement(&current_user.0, movement_id, input)
        .await?;
    Ok(Json(movement))
}

/// Delete a receipt
pub async fn delete_inbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(movement_id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let service = InboundService::new(state.db);
    service.delete_movement(&current_user.0, movement_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Approve a pending receipt
pub async fn approve_inbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(movement_id): AppPath<Uuid>,
) -> AppResult<Json<InboundMovement>> {
    let service = InboundService::new(state.db);
    let movement = service.approve(&current_user.0, movement_id).await?;
    Ok(Json(movement))
}

/// Reject a pending receipt; the body is optional
pub async fn reject_inbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(movement_id): AppPath<Uuid>,
    input: Option<AppJson<RejectInboundInput>>,
) -> AppResult<Json<InboundMovement>> {
    let input = input.map(|AppJson(i)| i).unwrap_or_default();
    let service = InboundService::new(state.db);
    let movement = service.reject(&current_user.0, movement_id, input).await?;
    Ok(Json(movement))
}
