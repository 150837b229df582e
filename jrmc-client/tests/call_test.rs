//! Request/response integration tests against a mock server

mod common;

use common::{mock_error_response, mock_response, MockWsServer};
use jrmc_client::{Error, JrmcClient};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn parse(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

#[tokio::test]
async fn test_call_success() {
    let server = MockWsServer::with_handler(|text| {
        let request = parse(&text);
        let x = request["params"][0].as_i64()?;
        Some(mock_response(&request["id"], json!(3 * x)))
    })
    .await;

    let client = JrmcClient::connect(&server.url()).await.unwrap();
    let result = client.call("/math", "triple", vec![json!(10)]).await.unwrap();
    assert_eq!(result, json!(30));

    client.disconnect().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_request_envelope_shape() {
    let mut server = MockWsServer::answering(json!(null)).await;

    let client = JrmcClient::connect(&server.url()).await.unwrap();
    client.call("a/b", "m", vec![json!("x"), json!(2)]).await.unwrap();

    let sent = parse(&server.next_message().await.unwrap());
    assert_eq!(sent["resource"], "a/b");
    assert_eq!(sent["method"], "m");
    assert_eq!(sent["params"], json!(["x", 2]));
    assert!(sent["id"].is_u64());

    client.disconnect().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_remote_error_is_passed_through() {
    let server = MockWsServer::with_handler(|text| {
        let request = parse(&text);
        Some(mock_error_response(&request["id"], "No such method: secret!"))
    })
    .await;

    let client = JrmcClient::connect(&server.url()).await.unwrap();
    let err = client.call("/math", "secret", vec![]).await.unwrap_err();

    match err {
        Error::Remote(message) => assert_eq!(message, "No such method: secret!"),
        other => panic!("Expected remote error, got {:?}", other),
    }

    client.disconnect().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_null_result_is_success() {
    let server = MockWsServer::answering(Value::Null).await;

    let client = JrmcClient::connect(&server.url()).await.unwrap();
    assert_eq!(client.call("/", "noop", vec![]).await.unwrap(), Value::Null);

    client.disconnect().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_call_typed() {
    let server = MockWsServer::with_handler(|text| {
        let request = parse(&text);
        let sum: i64 = request["params"].as_array()?.iter().filter_map(Value::as_i64).sum();
        Some(mock_response(&request["id"], json!(sum)))
    })
    .await;

    let client = JrmcClient::connect(&server.url()).await.unwrap();
    let sum: i64 = client.call_typed("/math", "add", (2, 3)).await.unwrap();
    assert_eq!(sum, 5);

    let wrong: Result<String, _> = client.call_typed("/math", "add", (2, 3)).await;
    assert!(matches!(wrong, Err(Error::Serialization(_))));

    client.disconnect().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_call_timeout() {
    let server = MockWsServer::with_handler(|_| None).await;

    let client = JrmcClient::connect(&server.url())
        .await
        .unwrap()
        .with_timeout(Duration::from_millis(100));

    let result = client.call("/", "silent", vec![]).await;
    assert!(matches!(result, Err(Error::Timeout)));
    assert_eq!(client.pending_calls().await, 0);

    client.disconnect().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_out_of_order_responses() {
    // Holds the first request and answers both, newest first, once the
    // second one arrives
    let held = Arc::new(Mutex::new(None::<Value>));
    let server = MockWsServer::with_replies(move |text| {
        let request = parse(&text);
        let mut slot = held.lock().unwrap();
        match slot.take() {
            None => {
                *slot = Some(request);
                vec![]
            }
            Some(first) => vec![
                mock_response(&request["id"], request["params"][0].clone()),
                mock_response(&first["id"], first["params"][0].clone()),
            ],
        }
    })
    .await;

    let client = JrmcClient::connect(&server.url()).await.unwrap();
    let first = {
        let client = client.clone();
        tokio::spawn(async move { client.call("/", "echo", vec![json!("a")]).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let second = client.call("/", "echo", vec![json!("b")]).await.unwrap();
    assert_eq!(second, json!("b"));
    assert_eq!(first.await.unwrap().unwrap(), json!("a"));

    client.disconnect().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_pending_calls_fail_when_server_goes_away() {
    let server = MockWsServer::with_handler(|_| None).await;
    let client = JrmcClient::connect(&server.url()).await.unwrap();

    let pending = {
        let client = client.clone();
        tokio::spawn(async move { client.call("/", "never", vec![]).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    client.disconnect().await;
    let result = tokio::time::timeout(Duration::from_secs(2), pending)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_err());

    server.shutdown().await;
}

#[tokio::test]
async fn test_connect_failure() {
    let result = JrmcClient::connect("ws://127.0.0.1:1").await;
    assert!(matches!(result, Err(Error::WebSocket(_))));
}
