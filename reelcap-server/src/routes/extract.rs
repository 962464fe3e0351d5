use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use reelcap_common::{ExtractionRequest, ExtractionResult, ReelcapError};

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/extract-caption", post(extract_caption))
}

async fn extract_caption(
    State(state): State<AppState>,
    payload: Result<Json<ExtractionRequest>, JsonRejection>,
) -> Result<Json<ExtractionResult>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| ReelcapError::MalformedRequest(rejection.body_text()))?;

    let result = state.service.extract(&request).await?;
    Ok(Json(result))
}
