//! HTTP surface of Reelcap.
//!
//! - `POST /api/extract-caption`: `{ "url": "..." }` in, [`ExtractionResult`] out
//! - `GET /api/health`: liveness probe
//!
//! [`ExtractionResult`]: reelcap_common::ExtractionResult
pub mod cli;
pub mod error;
pub mod routes;
pub mod state;
pub mod tether;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
