//! Common types and utilities shared across Reelcap crates.
//!
//! This crate defines the request/response model, header profiles, the
//! observability bootstrap, and the shared error taxonomy used throughout the
//! Reelcap workspace. It stays dependency-light so every crate can depend on it.
//!
//! # Overview
//!
//! - [`ExtractionRequest`] / [`ExtractionResult`]: the wire model of one call
//! - [`ExtractionMethod`]: which strategy produced a caption
//! - [`HeaderProfile`]: an impersonated client identity, pure data
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`ReelcapError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use reelcap_common::{ExtractionMethod, ExtractionResult};
//!
//! let ok = ExtractionResult::success("Hello", ExtractionMethod::MetaTags);
//! assert!(ok.success);
//! assert_eq!(ok.caption.as_deref(), Some("Hello"));
//! assert!(ok.error.is_none());
//! ```
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod observability;

/// Body of an extraction call. `url` stays optional so a missing field is
/// reported as an input error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionRequest {
    #[serde(default)]
    pub url: Option<String>,
}

impl ExtractionRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
        }
    }
}

/// Strategy that produced a caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    /// Structured JSON payload from the internal API endpoint.
    Api,
    /// `<script type="application/ld+json">` block.
    LdJson,
    /// Embed-page caption container.
    CaptionMarkup,
    /// `og:description` meta tag.
    MetaTags,
    /// Inline `"caption":"…"` JSON fragment.
    InlineJson,
    /// `window._sharedData` script blob.
    SharedData,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::LdJson => "ld-json",
            Self::CaptionMarkup => "caption-markup",
            Self::MetaTags => "meta-tags",
            Self::InlineJson => "inline-json",
            Self::SharedData => "shared-data",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one extraction call, serialized as the response payload.
///
/// `caption` is present iff `success`, `error` iff not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<ExtractionMethod>,
}

impl ExtractionResult {
    pub fn success(caption: impl Into<String>, method: ExtractionMethod) -> Self {
        Self {
            success: true,
            caption: Some(caption.into()),
            error: None,
            username: None,
            likes: None,
            method: Some(method),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            caption: None,
            error: Some(error.into()),
            username: None,
            likes: None,
            method: None,
        }
    }

    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    pub fn with_likes(mut self, likes: Option<u64>) -> Self {
        self.likes = likes;
        self
    }
}

/// Header set impersonating a client when fetching a post.
///
/// Profiles are plain data so new ones can be declared in configuration
/// without touching the fetch code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderProfile {
    pub user_agent: String,
    #[serde(default)]
    pub accept: Option<String>,
    #[serde(default)]
    pub accept_language: Option<String>,
    #[serde(default)]
    pub referer: Option<String>,
    /// Additional raw headers, e.g. `x-ig-app-id`.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl HeaderProfile {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            accept: None,
            accept_language: None,
            referer: None,
            headers: BTreeMap::new(),
        }
    }
}

/// Error types used across the Reelcap system.
///
/// The `Display` text of each variant is safe to hand to callers; detail
/// carried by `Fetch` and `Internal` is for logs only.
#[derive(thiserror::Error, Debug)]
pub enum ReelcapError {
    /// The request did not carry a URL.
    #[error("URL is required")]
    MissingUrl,

    /// The request body could not be decoded.
    #[error("Invalid request body: {0}")]
    MalformedRequest(String),

    /// The URL does not look like an Instagram post or reel.
    #[error("Invalid Instagram URL")]
    InvalidUrl,

    /// The URL passed validation but no shortcode could be derived.
    #[error("Could not extract shortcode from URL")]
    Identifier,

    /// Network failure, timeout, or a non-2xx response.
    #[error(
        "Could not fetch the post. It might be private or Instagram blocked the request."
    )]
    Fetch(String),

    /// The content was fetched but no strategy produced a caption.
    #[error("Caption not found in the fetched content")]
    CaptionNotFound,

    /// Anything unexpected. The detail never leaves the process.
    #[error("Internal server error")]
    Internal(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ReelcapError {
    /// True for errors caused by the caller's input rather than by us or the
    /// remote platform.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingUrl | Self::MalformedRequest(_) | Self::InvalidUrl | Self::Identifier
        )
    }

    /// Internal detail suitable for logs, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Fetch(detail) | Self::Internal(detail) => Some(detail),
            _ => None,
        }
    }
}

impl From<&ReelcapError> for ExtractionResult {
    fn from(err: &ReelcapError) -> Self {
        ExtractionResult::failure(err.to_string())
    }
}

/// Convenient alias for results that use [`ReelcapError`].
pub type Result<T> = std::result::Result<T, ReelcapError>;
