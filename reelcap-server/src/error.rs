use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reelcap_common::{ExtractionResult, ReelcapError};

/// HTTP face of [`ReelcapError`]. The body is always an
/// [`ExtractionResult`] failure carrying the caller-safe message.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub ReelcapError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                error = %self.0,
                detail = self.0.detail().unwrap_or(""),
                "request failed"
            );
        } else {
            tracing::info!(status = status.as_u16(), error = %self.0, "request rejected");
        }

        (status, Json(ExtractionResult::from(&self.0))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_bad_requests() {
        for err in [
            ReelcapError::MissingUrl,
            ReelcapError::MalformedRequest("eof".into()),
            ReelcapError::InvalidUrl,
            ReelcapError::Identifier,
        ] {
            assert_eq!(ApiError(err).status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn everything_else_is_a_server_error() {
        for err in [
            ReelcapError::Fetch("timeout".into()),
            ReelcapError::CaptionNotFound,
            ReelcapError::Internal("boom".into()),
            ReelcapError::Config("bad".into()),
        ] {
            assert_eq!(ApiError(err).status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
