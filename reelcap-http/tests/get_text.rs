use std::time::Duration;

use reelcap_common::HeaderProfile;
use reelcap_http::{HttpClient, HttpError, RequestOpts, profile_headers};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> HttpClient {
    HttpClient::new()
        .expect("client builds")
        .with_timeout(Duration::from_secs(2))
}

#[tokio::test]
async fn returns_body_and_sends_profile_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/ABC/"))
        .and(query_param("__a", "1"))
        .and(header("user-agent", "TestAgent/1.0"))
        .and(header("accept-language", "en-US"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json; charset=utf-8")
                .set_body_string(r#"{"items":[]}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut profile = HeaderProfile::new("TestAgent/1.0");
    profile.accept_language = Some("en-US".into());
    let opts = RequestOpts {
        headers: Some(profile_headers(&profile).unwrap()),
    };

    let resp = client()
        .get_text(&format!("{}/p/ABC/?__a=1", server.uri()), opts)
        .await
        .expect("request succeeds");

    assert!(resp.status.is_success());
    assert!(resp.is_json());
    assert_eq!(resp.body, r#"{"items":[]}"#);
}

#[tokio::test]
async fn non_success_status_is_an_error_with_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_string(r#"{"message":"Please wait a few minutes","status":"fail"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client()
        .get_text(&format!("{}/p/ABC/", server.uri()), RequestOpts::default())
        .await
        .unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(429));
    assert!(!err.is_timeout());
    match err {
        HttpError::Status { status, message } => {
            assert_eq!(status.as_u16(), 429);
            assert_eq!(message, "Please wait a few minutes");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_responses_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client()
        .with_timeout(Duration::from_millis(100))
        .get_text(&format!("{}/slow", server.uri()), RequestOpts::default())
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got {err:?}");
}

#[tokio::test]
async fn rejects_unparseable_urls_without_sending() {
    let err = client()
        .get_text("not a url", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Url(_)));
}
