//! Request orchestration: validate, fetch, extract, fall back once.
use std::sync::Arc;

use reelcap_common::{ExtractionRequest, ExtractionResult, ReelcapError};
use reelcap_http::HttpError;

use super::client::{FetchMethod, PostFetcher, PostRef};
use super::extract::extract_caption;
use super::url::{extract_shortcode, is_post_url};

/// Turns an [`ExtractionRequest`] into an [`ExtractionResult`].
///
/// Input errors are returned before any outbound request is made. The API
/// method is tried first; when it fails to fetch or yields no caption, the
/// page method is tried exactly once (unless fallback is disabled). When
/// every attempt fails, the last attempt's error is reported.
#[derive(Clone)]
pub struct CaptionService {
    fetcher: Arc<dyn PostFetcher>,
    fallback: bool,
}

impl std::fmt::Debug for CaptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionService")
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl CaptionService {
    pub fn new(fetcher: Arc<dyn PostFetcher>) -> Self {
        Self {
            fetcher,
            fallback: true,
        }
    }

    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Validate the request into a [`PostRef`] without touching the network.
    ///
    /// The URL is matched as given; surrounding whitespace makes it invalid.
    pub fn validate(request: &ExtractionRequest) -> Result<PostRef, ReelcapError> {
        let url = request
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(ReelcapError::MissingUrl)?;
        if !is_post_url(url) {
            return Err(ReelcapError::InvalidUrl);
        }
        let shortcode = extract_shortcode(url).ok_or(ReelcapError::Identifier)?;
        Ok(PostRef {
            url: url.to_string(),
            shortcode,
        })
    }

    #[tracing::instrument(level = "info", skip_all, fields(url = request.url.as_deref().unwrap_or("")))]
    pub async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionResult, ReelcapError> {
        let post = Self::validate(request).inspect_err(|e| {
            tracing::info!(error = %e, "extract.rejected");
        })?;

        let methods: &[FetchMethod] = if self.fallback {
            &[FetchMethod::Api, FetchMethod::Page]
        } else {
            &[FetchMethod::Api]
        };

        let mut last_err = ReelcapError::CaptionNotFound;
        for &method in methods {
            match self.attempt(method, &post).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::warn!(
                        %method,
                        shortcode = %post.shortcode,
                        error = %e,
                        detail = e.detail().unwrap_or(""),
                        "extract.attempt_failed"
                    );
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    async fn attempt(
        &self,
        method: FetchMethod,
        post: &PostRef,
    ) -> Result<ExtractionResult, ReelcapError> {
        let body = self
            .fetcher
            .fetch(method, post)
            .await
            .map_err(fetch_error)?;
        let extraction = extract_caption(&body).ok_or(ReelcapError::CaptionNotFound)?;
        tracing::info!(
            %method,
            shortcode = %post.shortcode,
            strategy = %extraction.method,
            caption_len = extraction.caption.len(),
            "extract.success"
        );
        Ok(extraction.into())
    }
}

fn fetch_error(err: HttpError) -> ReelcapError {
    tracing::debug!(
        timeout = err.is_timeout(),
        status = err.status().map(|s| s.as_u16()),
        "extract.fetch_failed"
    );
    ReelcapError::Fetch(err.to_string())
}
