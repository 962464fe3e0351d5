pub mod extract;
pub mod health;

use std::any::Any;

use axum::Router;
use axum::response::{IntoResponse, Response};
use reelcap_common::ReelcapError;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyCors, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyCors)
        .allow_methods(AnyCors)
        .allow_headers(AnyCors);

    Router::new()
        .nest("/api", api_routes())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(extract::routes())
}

/// Turn a handler panic into the generic 500 payload.
fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    ApiError(ReelcapError::Internal(detail)).into_response()
}
