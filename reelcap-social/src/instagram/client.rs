//! Fetch side of the pipeline.
//!
//! [`PostFetcher`] is the seam between orchestration and the network so the
//! service can be exercised without sockets. [`InstagramClient`] is the real
//! implementation: one GET per call, with the header profile chosen by the
//! [`FetchMethod`].
use std::fmt;

use async_trait::async_trait;
use reelcap_common::HeaderProfile;
use reelcap_http::{HttpClient, HttpError, RequestOpts, profile_headers};
use reqwest::header::HeaderMap;

const SHORTCODE_PLACEHOLDER: &str = "{shortcode}";

/// Where a post's content is fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchMethod {
    /// Internal JSON endpoint derived from the shortcode.
    Api,
    /// The post page itself, as given by the caller.
    Page,
}

impl fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Api => "api",
            Self::Page => "page",
        })
    }
}

/// A validated post: the caller's URL and its shortcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRef {
    pub url: String,
    pub shortcode: String,
}

#[async_trait]
pub trait PostFetcher: Send + Sync {
    /// Fetch the raw body for `post` using `method`. Exactly one outbound
    /// request per call.
    async fn fetch(&self, method: FetchMethod, post: &PostRef) -> Result<String, HttpError>;
}

/// HTTP-backed [`PostFetcher`] impersonating a browser.
#[derive(Clone, Debug)]
pub struct InstagramClient {
    http: HttpClient,
    api_endpoint: String,
    page_endpoint: Option<String>,
    api_headers: HeaderMap,
    page_headers: HeaderMap,
}

impl InstagramClient {
    /// `api_endpoint` must contain a `{shortcode}` placeholder.
    pub fn new(
        http: HttpClient,
        api_endpoint: impl Into<String>,
        api_profile: &HeaderProfile,
        page_profile: &HeaderProfile,
    ) -> Result<Self, HttpError> {
        let api_endpoint = api_endpoint.into();
        if !api_endpoint.contains(SHORTCODE_PLACEHOLDER) {
            return Err(HttpError::Url(format!(
                "api endpoint `{api_endpoint}` has no {SHORTCODE_PLACEHOLDER} placeholder"
            )));
        }
        Ok(Self {
            http,
            api_endpoint,
            page_endpoint: None,
            api_headers: profile_headers(api_profile)?,
            page_headers: profile_headers(page_profile)?,
        })
    }

    /// Fetch pages from a `{shortcode}` template instead of the caller's URL.
    pub fn with_page_endpoint(mut self, endpoint: Option<String>) -> Result<Self, HttpError> {
        if let Some(endpoint) = endpoint.as_deref().filter(|e| !e.contains(SHORTCODE_PLACEHOLDER)) {
            return Err(HttpError::Url(format!(
                "page endpoint `{endpoint}` has no {SHORTCODE_PLACEHOLDER} placeholder"
            )));
        }
        self.page_endpoint = endpoint;
        Ok(self)
    }

    /// Target URL for `method`.
    pub fn target_url(&self, method: FetchMethod, post: &PostRef) -> String {
        match method {
            FetchMethod::Api => self
                .api_endpoint
                .replace(SHORTCODE_PLACEHOLDER, &post.shortcode),
            FetchMethod::Page => match &self.page_endpoint {
                Some(template) => template.replace(SHORTCODE_PLACEHOLDER, &post.shortcode),
                None => post.url.clone(),
            },
        }
    }

    fn headers_for(&self, method: FetchMethod) -> &HeaderMap {
        match method {
            FetchMethod::Api => &self.api_headers,
            FetchMethod::Page => &self.page_headers,
        }
    }
}

#[async_trait]
impl PostFetcher for InstagramClient {
    async fn fetch(&self, method: FetchMethod, post: &PostRef) -> Result<String, HttpError> {
        let url = self.target_url(method, post);
        let opts = RequestOpts {
            headers: Some(self.headers_for(method).clone()),
        };
        let resp = self.http.get_text(&url, opts).await?;
        tracing::debug!(
            %method,
            shortcode = %post.shortcode,
            json = resp.is_json(),
            body_len = resp.body.len(),
            "instagram.fetched"
        );
        Ok(resp.body)
    }
}
