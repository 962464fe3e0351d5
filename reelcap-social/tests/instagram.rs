use std::sync::Arc;
use std::time::Duration;

use reelcap_common::{ExtractionMethod, ExtractionRequest, HeaderProfile, ReelcapError};
use reelcap_http::HttpClient;
use reelcap_social::instagram::{CaptionService, FetchMethod, InstagramClient, PostFetcher, PostRef};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POST_URL: &str = "https://www.instagram.com/reel/XYZ/";

fn profiles() -> (HeaderProfile, HeaderProfile) {
    let mut api = HeaderProfile::new("ApiAgent/1.0");
    api.headers.insert("x-ig-app-id".into(), "936619743392459".into());
    let page = HeaderProfile::new("PageAgent/1.0");
    (api, page)
}

fn client(server: &MockServer, timeout: Duration) -> InstagramClient {
    let (api, page) = profiles();
    let http = HttpClient::new().expect("client builds").with_timeout(timeout);
    InstagramClient::new(
        http,
        format!("{}/p/{{shortcode}}/?__a=1&__d=dis", server.uri()),
        &api,
        &page,
    )
    .expect("valid endpoint")
    .with_page_endpoint(Some(format!("{}/reel/{{shortcode}}/", server.uri())))
    .expect("valid page endpoint")
}

fn service(server: &MockServer) -> CaptionService {
    CaptionService::new(Arc::new(client(server, Duration::from_secs(2))))
}

fn post() -> PostRef {
    PostRef {
        url: POST_URL.into(),
        shortcode: "XYZ".into(),
    }
}

#[tokio::test]
async fn api_fetch_uses_endpoint_and_api_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/XYZ/"))
        .and(query_param("__a", "1"))
        .and(query_param("__d", "dis"))
        .and(header("user-agent", "ApiAgent/1.0"))
        .and(header("x-ig-app-id", "936619743392459"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let body = client(&server, Duration::from_secs(2))
        .fetch(FetchMethod::Api, &post())
        .await
        .expect("api fetch");
    assert_eq!(body, "{}");
}

#[tokio::test]
async fn page_fetch_uses_page_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reel/XYZ/"))
        .and(header("user-agent", "PageAgent/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let body = client(&server, Duration::from_secs(2))
        .fetch(FetchMethod::Page, &post())
        .await
        .expect("page fetch");
    assert_eq!(body, "<html></html>");
}

#[test]
fn endpoints_require_placeholder() {
    let (api, page) = profiles();
    let http = HttpClient::new().unwrap();
    assert!(InstagramClient::new(http.clone(), "https://example.test/api", &api, &page).is_err());

    let ok = InstagramClient::new(http, "https://example.test/p/{shortcode}/", &api, &page).unwrap();
    assert_eq!(ok.target_url(FetchMethod::Api, &post()), "https://example.test/p/XYZ/");
    assert_eq!(ok.target_url(FetchMethod::Page, &post()), POST_URL);
    assert!(ok.with_page_endpoint(Some("https://example.test/embed".into())).is_err());
}

#[tokio::test]
async fn structured_payload_wins_without_page_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/XYZ/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string(
                    r#"{"graphql":{"shortcode_media":{
                        "edge_media_to_caption":{"edges":[{"node":{"text":"Sunset &amp; sea"}}]},
                        "owner":{"username":"natgeo"},
                        "edge_liked_by":{"count":42}
                    }}}"#,
                ),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reel/XYZ/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let res = service(&server)
        .extract(&ExtractionRequest::new(POST_URL))
        .await
        .expect("caption");

    assert!(res.success);
    assert_eq!(res.caption.as_deref(), Some("Sunset & sea"));
    assert_eq!(res.username.as_deref(), Some("natgeo"));
    assert_eq!(res.likes, Some(42));
    assert_eq!(res.method, Some(ExtractionMethod::Api));
}

#[tokio::test]
async fn blocked_api_falls_back_to_page_meta() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/XYZ/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(r#"{"message":"login_required"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reel/XYZ/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><meta property="og:description" content="Hello &amp; welcome"></head></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let res = service(&server)
        .extract(&ExtractionRequest::new(POST_URL))
        .await
        .expect("caption");

    assert_eq!(res.caption.as_deref(), Some("Hello & welcome"));
    assert_eq!(res.method, Some(ExtractionMethod::MetaTags));
    assert!(res.error.is_none());
}

#[tokio::test]
async fn timeouts_on_both_attempts_are_fetch_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .set_delay(Duration::from_secs(2)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let svc = CaptionService::new(Arc::new(client(&server, Duration::from_millis(100))));
    let err = svc
        .extract(&ExtractionRequest::new(POST_URL))
        .await
        .unwrap_err();

    assert!(matches!(err, ReelcapError::Fetch(_)));
    assert_eq!(
        err.to_string(),
        "Could not fetch the post. It might be private or Instagram blocked the request."
    );
}

#[tokio::test]
async fn invalid_url_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = service(&server)
        .extract(&ExtractionRequest::new("not-a-url"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReelcapError::InvalidUrl));
}

#[tokio::test]
async fn page_without_caption_reports_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/XYZ/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reel/XYZ/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>login</body></html>"))
        .mount(&server)
        .await;

    let err = service(&server)
        .extract(&ExtractionRequest::new(POST_URL))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Caption not found in the fetched content");
}
