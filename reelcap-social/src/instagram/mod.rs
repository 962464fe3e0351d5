//! Instagram post caption extraction.
//!
//! Submodules, leaves first:
//! - [`url`]: post URL validation and shortcode extraction (pure)
//! - [`decode`]: entity/escape normalization applied to every caption
//! - [`types`]: serde models for the structured API payload
//! - [`extract`]: ordered strategies combined with a first-success-wins rule
//! - [`client`]: the [`PostFetcher`] seam and its HTTP implementation
//! - [`service`]: request orchestration with a single page fallback
pub mod client;
pub mod decode;
pub mod extract;
pub mod service;
pub mod types;
pub mod url;

pub use client::{FetchMethod, InstagramClient, PostFetcher, PostRef};
pub use extract::{Extraction, extract_caption};
pub use service::CaptionService;
