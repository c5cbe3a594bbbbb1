//! HTTP handlers for outbound movements and request fulfillment

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use shared::{ListQuery, OutboundMovement, PaginatedResponse};
use uuid::Uuid;

use crate::{
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    middleware::CurrentUser,
    services::outbound::{
        CreateOutboundInput, OutboundService, ProcessRequestInput, UpdateOutboundInput,
    },
    AppState,
};

/// Record an outbound movement
pub async fn create_outbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<CreateOutboundInput>,
) -> AppResult<impl IntoResponse> {
    let service = OutboundService::new(state.db);
    let movement = service.create_movement(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// List outbound movements
pub async fn list_outbound(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<OutboundMovement>>> {
    let service = OutboundService::new(state.db);
    let movements = service.list_movements(&query.pagination()).await?;
    Ok(Json(movements))
}

/// Edit an outbound movement
pub async fn update_outbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(movement_id): AppPath<Uuid>,
    AppJson(input): AppJson<UpdateOutboundInput>,
) -> AppResult<Json<OutboundMovement>> {
    let service = OutboundService::new(state.db);
    let movement = service
        .update_movement(&current_user.0, movement_id, input)
        .await?;
    Ok(Json(movement))
}

/// Delete an outbound movement
pub async fn delete_outbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(movement_id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let service = OutboundService::new(state.db);
    service.delete_movement(&current_user.0, movement_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fulfill an approved request
pub async fn process_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(request_id): AppPath<Uuid>,
    AppJson(input): AppJson<ProcessRequestInput>,
) -> AppResult<impl IntoResponse> {
    let service = OutboundService::new(state.db);
    let movement = service
        .process_request(&current_user.0, request_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}
