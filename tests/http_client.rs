use std::io::Read;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wojak::{RequestBuilder, StatusCode};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
struct Pair {
    a: String,
    c: String,
}

fn pair() -> Pair {
    Pair {
        a: "b".to_string(),
        c: "d".to_string(),
    }
}

#[tokio::test]
async fn test_get_returns_raw_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/events"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain text"))
        .mount(&server)
        .await;

    let uri = server.uri();
    let response = tokio::task::spawn_blocking(move || {
        RequestBuilder::new()
            .with_base(format!("{uri}/api/v1/"))
            .append_path("/events")
            .execute_get()
    })
    .await
    .unwrap();

    assert!(response.is_ok());
    assert_eq!(response.comment(), None);
    assert_eq!(response.into_content(), Some(b"plain text".to_vec()));
}

#[tokio::test]
async fn test_post_json_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/post"))
        .and(header("content-type", "application/json"))
        .and(body_json(pair()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "json": pair(),
                "origin": "127.0.0.1",
            })),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let response = tokio::task::spawn_blocking(move || {
        RequestBuilder::new()
            .with_base(format!("{uri}/"))
            .append_path("post")
            .with_json_body(&pair())
            .unwrap()
            .execute_post()
    })
    .await
    .unwrap();

    let typed = response.clone().json_as::<Pair>();
    assert_eq!(typed.into_content(), Some(pair()));
    let value = response.as_json();
    assert_eq!(value.into_content(), Some(serde_json::json!({"a": "b", "c": "d"})));
}

#[tokio::test]
async fn test_wrong_method_maps_http_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/post"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;

    let uri = server.uri();
    let response = tokio::task::spawn_blocking(move || {
        RequestBuilder::new()
            .with_base(uri)
            .append_path("/post")
            .with_json_body(&pair())
            .unwrap()
            .execute_get()
            .as_json()
    })
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::Http(405));
    assert_eq!(response.status().code(), 10405);
    assert!(response.content().is_none());
    let comment = response.comment().unwrap();
    assert!(comment.contains("405"), "{comment}");
    assert!(comment.contains("Method Not Allowed"), "{comment}");
}

#[tokio::test]
async fn test_not_found_passthrough() {
    let server = MockServer::start().await;

    let uri = server.uri();
    let response = tokio::task::spawn_blocking(move || {
        RequestBuilder::new()
            .with_base(uri)
            .append_path("/missing")
            .execute_get()
    })
    .await
    .unwrap();

    assert_eq!(response.status().code(), 10404);
    assert_eq!(response.status().http_status(), Some(404));
}

#[tokio::test]
async fn test_timeout_names_configured_wait() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let response = tokio::task::spawn_blocking(move || {
        RequestBuilder::new()
            .with_base(uri)
            .append_path("/slow")
            .with_timeout(Duration::from_millis(100))
            .execute_get()
    })
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::Timeout);
    assert_eq!(response.status().code(), 408);
    assert!(response.comment().unwrap().contains("100ms"));
}

#[tokio::test]
async fn test_refused_connection_is_internal_error() {
    // Bind and drop a listener to get a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let response = tokio::task::spawn_blocking(move || {
        RequestBuilder::new()
            .with_base(format!("http://127.0.0.1:{port}/"))
            .execute_get()
    })
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::InternalServiceError);
    assert_eq!(response.comment(), Some("Connection error."));
}

#[tokio::test]
async fn test_dropped_connection_is_internal_error() {
    // Accept one connection, read the request and hang up without replying.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 1024];
        let _ = stream.read(&mut buf);
    });

    let response = tokio::task::spawn_blocking(move || {
        RequestBuilder::new()
            .with_base(format!("http://127.0.0.1:{port}/"))
            .execute_get()
    })
    .await
    .unwrap();
    server.join().unwrap();

    assert_eq!(response.status(), StatusCode::InternalServiceError);
    assert_eq!(response.status().code(), 500);
    assert_eq!(response.comment(), Some("Connection error."));
}

#[tokio::test]
async fn test_malformed_url_is_internal_error() {
    let response =
        tokio::task::spawn_blocking(|| RequestBuilder::new().with_base("not a url").execute_get())
            .await
            .unwrap();

    assert_eq!(response.status(), StatusCode::InternalServiceError);
    assert!(response.comment().unwrap().starts_with("Unexpected transport error"));
}

#[tokio::test]
async fn test_repeated_headers_and_params_are_all_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/echo"))
        .and(query_param("single", "x"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let uri = server.uri();
    let response = tokio::task::spawn_blocking(move || {
        RequestBuilder::new()
            .with_base(uri)
            .append_path("echo")
            .with_header("X-Tag", "first")
            .with_header("X-Tag", "second")
            .with_param("id", "1")
            .with_param("id", "2")
            .with_param("single", "x")
            .execute_get()
    })
    .await
    .unwrap();
    assert!(response.is_ok());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    let tags: Vec<&str> = request
        .headers
        .get_all("x-tag")
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["first", "second"]);

    let ids: Vec<String> = request
        .url
        .query_pairs()
        .filter(|(k, _)| k == "id")
        .map(|(_, v)| v.into_owned())
        .collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[tokio::test]
async fn test_non_json_body_is_decoding_fault() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let uri = server.uri();
    let response = tokio::task::spawn_blocking(move || {
        RequestBuilder::new().with_base(uri).execute_get().as_json()
    })
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::JsonConversionError);
    assert_eq!(response.status().code(), 603);
    assert!(response.content().is_none());
}
