use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use reelcap_http::HttpError;
use reelcap_server::{AppState, create_router};
use reelcap_social::instagram::{CaptionService, FetchMethod, PostFetcher, PostRef};
use serde_json::{Value, json};
use tower::ServiceExt;

enum Behavior {
    Body(&'static str),
    Timeout,
    Panic,
}

struct CountingFetcher {
    behavior: Behavior,
    calls: AtomicUsize,
}

impl CountingFetcher {
    fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PostFetcher for CountingFetcher {
    async fn fetch(&self, _method: FetchMethod, _post: &PostRef) -> Result<String, HttpError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Body(body) => Ok(body.to_string()),
            Behavior::Timeout => Err(HttpError::Timeout(Duration::from_secs(10))),
            Behavior::Panic => panic!("fetcher exploded"),
        }
    }
}

fn app(fetcher: Arc<CountingFetcher>) -> Router {
    create_router(AppState::new(CaptionService::new(fetcher)))
}

fn extract_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/extract-caption")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn meta_description_caption_is_returned() {
    let fetcher = CountingFetcher::new(Behavior::Body(
        r#"<meta property="og:description" content="Hello &amp; welcome">"#,
    ));
    let body = json!({ "url": "https://www.instagram.com/p/ABC123xyz/" }).to_string();

    let (status, json) = send(app(fetcher.clone()), extract_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["caption"], "Hello & welcome");
    assert_eq!(json["method"], "meta-tags");
    assert!(json.get("error").is_none());
    // the api attempt already found the caption
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn fetch_timeout_is_a_server_error() {
    let fetcher = CountingFetcher::new(Behavior::Timeout);
    let body = json!({ "url": "https://instagram.com/reel/XYZ/" }).to_string();

    let (status, json) = send(app(fetcher.clone()), extract_request(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json,
        json!({
            "success": false,
            "error": "Could not fetch the post. It might be private or Instagram blocked the request."
        })
    );
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn invalid_url_is_rejected_without_fetching() {
    let fetcher = CountingFetcher::new(Behavior::Body("unused"));
    let body = json!({ "url": "not-a-url" }).to_string();

    let (status, json) = send(app(fetcher.clone()), extract_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({ "success": false, "error": "Invalid Instagram URL" }));
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn missing_url_is_rejected() {
    let fetcher = CountingFetcher::new(Behavior::Body("unused"));

    let (status, json) = send(app(fetcher.clone()), extract_request("{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "URL is required");
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let fetcher = CountingFetcher::new(Behavior::Body("unused"));

    let (status, json) = send(app(fetcher.clone()), extract_request("{\"url\": ")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request body:")
    );
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn no_caption_anywhere_is_a_server_error() {
    let fetcher = CountingFetcher::new(Behavior::Body("<html><body>Log in</body></html>"));
    let body = json!({ "url": "https://www.instagram.com/p/ABC/" }).to_string();

    let (status, json) = send(app(fetcher.clone()), extract_request(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Caption not found in the fetched content");
}

#[tokio::test]
async fn panics_become_generic_internal_errors() {
    let fetcher = CountingFetcher::new(Behavior::Panic);
    let body = json!({ "url": "https://www.instagram.com/p/ABC/" }).to_string();

    let (status, json) = send(app(fetcher), extract_request(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({ "success": false, "error": "Internal server error" }));
}

#[tokio::test]
async fn health_reports_ok() {
    let fetcher = CountingFetcher::new(Behavior::Body("unused"));
    let req = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();

    let (status, json) = send(app(fetcher.clone()), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "status": "OK", "message": "Server is running" }));
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let fetcher = CountingFetcher::new(Behavior::Body("unused"));
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/extract-caption")
        .header(header::ORIGIN, "https://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let resp = app(fetcher).oneshot(req).await.unwrap();

    assert!(resp.status().is_success());
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
