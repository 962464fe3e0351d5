use std::sync::Arc;

use reelcap_common::{HeaderProfile, ReelcapError};
use reelcap_config::ReelcapConfig;
use reelcap_http::HttpClient;
use reelcap_social::instagram::{CaptionService, InstagramClient};

#[derive(Clone, Debug)]
pub struct AppState {
    pub service: Arc<CaptionService>,
}

impl AppState {
    pub fn new(service: CaptionService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Wire the HTTP client, header profiles and fetch policy from `config`.
    pub fn from_config(config: &ReelcapConfig) -> Result<Self, ReelcapError> {
        let fetch = &config.fetch;
        let api_profile = lookup_profile(config, &fetch.api_profile)?;
        let page_profile = lookup_profile(config, &fetch.page_profile)?;

        let http = HttpClient::new()
            .map_err(|e| ReelcapError::Config(e.to_string()))?
            .with_timeout(fetch.timeout());
        let client = InstagramClient::new(http, &fetch.api_endpoint, api_profile, page_profile)
            .and_then(|c| c.with_page_endpoint(fetch.page_endpoint.clone()))
            .map_err(|e| ReelcapError::Config(e.to_string()))?;

        tracing::info!(
            api_endpoint = %fetch.api_endpoint,
            api_profile = %fetch.api_profile,
            page_profile = %fetch.page_profile,
            timeout_secs = fetch.timeout_secs,
            fallback = fetch.fallback,
            "caption service configured"
        );

        let service = CaptionService::new(Arc::new(client)).with_fallback(fetch.fallback);
        Ok(Self::new(service))
    }
}

fn lookup_profile<'a>(
    config: &'a ReelcapConfig,
    name: &str,
) -> Result<&'a HeaderProfile, ReelcapError> {
    config
        .profile(name)
        .ok_or_else(|| ReelcapError::Config(format!("unknown header profile `{name}`")))
}
