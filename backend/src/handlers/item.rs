//! HTTP handlers for the item catalogue

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use shared::{Item, PaginatedResponse, Pagination};
use uuid::Uuid;

use crate::{
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    middleware::CurrentUser,
    services::item::{CreateItemInput, ItemService, UpdateItemInput},
    AppState,
};

/// Query parameters for listing items
#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

/// List items
pub async fn list_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<ListItemsQuery>,
) -> AppResult<Json<PaginatedResponse<Item>>> {
    let defaults = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };
    let service = ItemService::new(state.db);
    let items = service.list_items(&pagination, query.search).await?;
    Ok(Json(items))
}

/// Items at or below their minimum stock
pub async fn list_low_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Item>>> {
    let service = ItemService::new(state.db);
    let items = service.list_low_stock().await?;
    Ok(Json(items))
}

/// Get an item by ID
pub async fn get_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppPath(item_id): AppPath<Uuid>,
) -> AppResult<Json<Item>> {
    let service = ItemService::new(state.db);
    let item = service.get_item(item_id).await?;
    Ok(Json(item))
}

/// Create an item
pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<CreateItemInput>,
) -> AppResult<impl IntoResponse> {
    let service = ItemService::new(state.db);
    let item = service.create_item(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Update an item
pub async fn update_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(item_id): AppPath<Uuid>,
    AppJson(input): AppJson<UpdateItemInput>,
) -> AppResult<Json<Item>> {
    let service = ItemService::new(state.db);
    let item = service.update_item(&current_user.0, item_id, input).await?;
    Ok(Json(item))
}

/// Delete an item
pub async fn delete_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(item_id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let service = ItemService::new(state.db);
    service.delete_item(&current_user.0, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
