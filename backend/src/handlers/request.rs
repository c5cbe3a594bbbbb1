//! HTTP handlers for item requests

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use shared::{ItemRequest, ListQuery, PaginatedResponse};
use uuid::Uuid;

use crate::{
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    middleware::CurrentUser,
    services::request::{CreateRequestInput, RequestService, SetStatusInput},
    AppState,
};

/// Submit a request
pub async fn create_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<CreateRequestInput>,
) -> AppResult<impl IntoResponse> {
    let service = RequestService::new(state.db, state.notifier);
    let request = service.create_request(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// List all requests
pub async fn list_requests(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<ItemRequest>>> {
    let service = RequestService::new(state.db, state.notifier);
    let requests = service
        .list_requests(&query.pagination(), query.status)
        .await?;
    Ok(Json(requests))
}

/// Track the caller's own requests
pub async fn list_my_requests(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<ItemRequest>>> {
    let service = RequestService::new(state.db, state.notifier);
    let requests = service.list_for_user(current_user.0.user_id).await?;
    Ok(Json(requests))
}

/// Get a request by ID
pub async fn get_request(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppPath(request_id): AppPath<Uuid>,
) -> AppResult<Json<ItemRequest>> {
    let service = RequestService::new(state.db, state.notifier);
    let request = service.get_request(request_id).await?;
    Ok(Json(request))
}

/// Approve or reject a request
pub async fn set_request_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(request_id): AppPath<Uuid>,
    AppJson(input): AppJson<SetStatusInput>,
) -> AppResult<Json<ItemRequest>> {
    let service = RequestService::new(state.db, state.notifier);
    let request = service
        .set_status(&current_user.0, request_id, input)
        .await?;
    Ok(Json(request))
}
