//! Exercises [`ReqwestTransport`] against a real HTTP server, complementing
//! the ingest-loop tests in `streaming.rs` (which drive the client against
//! [`evm_portal_test_utils::FakeTransport`] and never touch the `reqwest`
//! code path itself).

use evm_portal_client::{ReqwestTransport, StreamResponse, Transport};
use evm_portal_types::WireRequest;
use futures::StreamExt as _;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_height_parses_the_plaintext_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/finalized-stream/height"))
        .respond_with(ResponseTemplate::new(200).set_body_string("123456"))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(reqwest::Client::new(), Default::default());
    let url = url::Url::parse(&format!("{}/finalized-stream/height", server.uri())).unwrap();
    let height = transport.get_height(&url).await.unwrap();
    assert_eq!(height, 123_456);
}

#[tokio::test]
async fn get_height_rejects_a_non_numeric_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/finalized-stream/height"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not-a-number"))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(reqwest::Client::new(), Default::default());
    let url = url::Url::parse(&format!("{}/finalized-stream/height", server.uri())).unwrap();
    assert!(transport.get_height(&url).await.is_err());
}

#[tokio::test]
async fn post_stream_204_decodes_as_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/finalized-stream"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(reqwest::Client::new(), Default::default());
    let url = url::Url::parse(&format!("{}/finalized-stream", server.uri())).unwrap();
    let body = WireRequest { from_block: 10, ..Default::default() };
    assert!(matches!(transport.post_stream(&url, &body).await.unwrap(), StreamResponse::NoContent));
}

#[tokio::test]
async fn post_stream_200_streams_the_ndjson_body() {
    let server = MockServer::start().await;
    let body = WireRequest { from_block: 5, ..Default::default() };
    Mock::given(method("POST"))
        .and(path("/finalized-stream"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"header":{"number":5,"hash":"0x5","parentHash":"0x4"}}
{"header":{"number":6,"hash":"0x6","parentHash":"0x5"}}
"#,
        ))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(reqwest::Client::new(), Default::default());
    let url = url::Url::parse(&format!("{}/finalized-stream", server.uri())).unwrap();
    let StreamResponse::Ok(mut stream) = transport.post_stream(&url, &body).await.unwrap() else {
        panic!("expected a streaming 200 response");
    };

    let mut collected = Vec::new();
    while let Some(chunk) = stream.next().await {
        collected.extend_from_slice(&chunk.unwrap());
    }
    let text = String::from_utf8(collected).unwrap();
    assert!(text.contains("\"number\":5"));
    assert!(text.contains("\"number\":6"));
}

#[tokio::test]
async fn post_stream_other_status_is_a_fatal_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/finalized-stream"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(reqwest::Client::new(), Default::default());
    let url = url::Url::parse(&format!("{}/finalized-stream", server.uri())).unwrap();
    let body = WireRequest { from_block: 0, ..Default::default() };
    let err = transport.post_stream(&url, &body).await.unwrap_err();
    assert!(err.to_string().contains("500"));
}
