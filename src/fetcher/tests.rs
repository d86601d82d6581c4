use super::http::decode_document;
use super::*;
use crate::config::SourceConfig;
use crate::error::{Error, TransportError};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn comic_json(num: u32) -> serde_json::Value {
    json!({
        "month": "1",
        "num": num,
        "link": "",
        "year": "2006",
        "news": "",
        "safe_title": format!("Comic {num}"),
        "transcript": "",
        "alt": "alt text",
        "img": format!("https://imgs.xkcd.com/comics/comic_{num}.png"),
        "title": format!("Comic {num}"),
        "day": "1"
    })
}

fn fetcher_for(server: &MockServer) -> HttpFetcher {
    let config = SourceConfig {
        base_url: server.uri(),
        request_timeout: Duration::from_secs(5),
        ..Default::default()
    };
    HttpFetcher::from_config(&config).unwrap()
}

#[tokio::test]
async fn fetch_latest_decodes_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info.0.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(comic_json(2950)))
        .mount(&server)
        .await;

    let doc = fetcher_for(&server).fetch_latest().await.unwrap();

    assert_eq!(doc.id, 2950);
    assert_eq!(doc.title, "Comic 2950");
    assert_eq!(doc.year, "2006");
    assert_eq!(doc.alt_text, "alt text");
    assert_eq!(doc.image_ref, "https://imgs.xkcd.com/comics/comic_2950.png");
    assert_eq!(doc.transcript, None, "empty transcript becomes None");
    assert!(doc.payload.is_none());
}

#[tokio::test]
async fn fetch_by_id_uses_numbered_endpoint() {
    let server = MockServer::start().await;
    let mut body = comic_json(614);
    body["transcript"] = json!("[[A man sits at a desk]]");
    body["link"] = json!("https://xkcd.com/614/large/");
    Mock::given(method("GET"))
        .and(path("/614/info.0.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let doc = fetcher_for(&server).fetch_by_id(614).await.unwrap();

    assert_eq!(doc.id, 614);
    assert_eq!(doc.transcript.as_deref(), Some("[[A man sits at a desk]]"));
    assert_eq!(doc.origin_url, "https://xkcd.com/614/large/");
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mirror/3/info.0.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(comic_json(3)))
        .mount(&server)
        .await;

    let config = SourceConfig {
        base_url: format!("{}/mirror", server.uri()),
        ..Default::default()
    };
    let fetcher = HttpFetcher::from_config(&config).unwrap();

    assert_eq!(fetcher.fetch_by_id(3).await.unwrap().id, 3);
}

#[tokio::test]
async fn fetch_by_id_zero_is_rejected_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(comic_json(1)))
        .expect(0)
        .mount(&server)
        .await;

    let err = fetcher_for(&server).fetch_by_id(0).await.unwrap_err();
    assert!(matches!(err, Error::InvalidId(0)));
}

#[tokio::test]
async fn not_found_status_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/404/info.0.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = fetcher_for(&server).fetch_by_id(404).await.unwrap_err();
    match err {
        Error::Transport(TransportError::Status { status, url }) => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/404/info.0.json"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info.0.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = fetcher_for(&server).fetch_latest().await.unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn mismatched_number_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/7/info.0.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(comic_json(8)))
        .mount(&server)
        .await;

    let err = fetcher_for(&server).fetch_by_id(7).await.unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn unreachable_source_is_request_error() {
    let config = SourceConfig {
        // nothing listens on the discard port
        base_url: "http://127.0.0.1:9".to_string(),
        request_timeout: Duration::from_secs(2),
        ..Default::default()
    };
    let fetcher = HttpFetcher::from_config(&config).unwrap();

    let err = fetcher.fetch_latest().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Transport(TransportError::Request { .. })
    ));
}

#[tokio::test]
async fn fetch_payload_returns_bytes() {
    let server = MockServer::start().await;
    let png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a];
    Mock::given(method("GET"))
        .and(path("/comics/barrel.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png.clone()))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server);
    let absolute = format!("{}/comics/barrel.png", server.uri());

    assert_eq!(fetcher.fetch_payload(&absolute).await.unwrap(), png);
    assert_eq!(
        fetcher.fetch_payload("comics/barrel.png").await.unwrap(),
        png
    );
}

#[tokio::test]
async fn fetch_payload_without_reference_fails() {
    let server = MockServer::start().await;
    let err = fetcher_for(&server).fetch_payload("  ").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn decode_rejects_unresolved_document() {
    let body = serde_json::to_vec(&comic_json(0)).unwrap();
    let err = decode_document("https://xkcd.com/info.0.json", &body).unwrap_err();
    match err {
        Error::Decode { reason, .. } => assert!(reason.contains("no number")),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[test]
fn decode_tolerates_missing_and_extra_fields() {
    let body = br#"{"num": 1, "title": "Barrel - Part 1", "extra_parts": {"pre": ""}}"#;
    let doc = decode_document("https://xkcd.com/1/info.0.json", body).unwrap();
    assert_eq!(doc.id, 1);
    assert_eq!(doc.title, "Barrel - Part 1");
    assert!(doc.image_ref.is_empty());
}

#[test]
fn endpoint_urls() {
    let fetcher = HttpFetcher::new(
        HttpTransport::new(&SourceConfig::default()).unwrap(),
        parse_base_url("https://xkcd.com").unwrap(),
    );
    assert_eq!(
        fetcher.latest_url().unwrap().as_str(),
        "https://xkcd.com/info.0.json"
    );
    assert_eq!(
        fetcher.document_url(1234).unwrap().as_str(),
        "https://xkcd.com/1234/info.0.json"
    );
}
