//! Route definitions for the Stockroom inventory backend

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes. Everything except the health check requires a bearer
/// token.
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .nest("/items", item_routes())
        .nest("/requests", request_routes())
        .nest("/inbound", inbound_routes())
        .nest("/outbound", outbound_routes())
        .route("/notifications", get(handlers::list_notifications))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(protected)
}

/// Item catalogue routes
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route("/low-stock", get(handlers::list_low_stock))
        .route(
            "/:item_id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
}

/// Item request routes
fn request_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_requests).post(handlers::create_request),
        )
        .route("/mine", get(handlers::list_my_requests))
        .route("/:request_id", get(handlers::get_request))
        .route("/:request_id/status", put(handlers::set_request_status))
}

/// Inbound movement routes
fn inbound_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_inbound).post(handlers::create_inbound))
        .route(
            "/:movement_id",
            put(handlers::update_inbound).delete(handlers::delete_inbound),
        )
        .route("/:movement_id/approve", patch(handlers::approve_inbound))
        .route("/:movement_id/reject", patch(handlers::reject_inbound))
}

/// Outbound movement routes
fn outbound_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_outbound).post(handlers::create_outbound),
        )
        .route(
            "/:movement_id",
            put(handlers::update_outbound).delete(handlers::delete_outbound),
        )
        .route(
            "/process-request/:request_id",
            post(handlers::process_request),
        )
}
