//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::{
    AppState, Error,
    auth::{post_log_in, register_user},
    endpoints,
    expense::{create_expense_endpoint, list_expenses_endpoint},
    scan::scan_endpoint,
};

/// Return a router with all the app's routes.
///
/// The expense routes need a bearer token from [endpoints::LOG_IN].
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_status))
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::ADD_EXPENSE, post(create_expense_endpoint))
        .route(endpoints::SCAN_EXPENSES, post(scan_endpoint))
        .route(endpoints::USER_EXPENSES, get(list_expenses_endpoint))
        .fallback(get_404_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Let clients check that the API is up.
async fn get_status() -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "message": "spending-tracker backend API is working correctly and you can see it here!"
        })),
    )
        .into_response()
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
