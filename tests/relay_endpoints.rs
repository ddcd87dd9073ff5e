//! End-to-end tests for the interview backend client over real HTTP.
//!
//! A minimal canned responder on a local TCP port stands in for the
//! backend; each test asserts both the wire shape of what the relay sends
//! and how responses map to outcomes.

use serde_json::Value;
use std::sync::Arc;
use std::sync::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use viva::interview::SessionContext;
use viva::relay::{AnswerRelay, ConversationRelay, RelayOutcome, SkipReason};

/// Captured request: path and parsed JSON body.
#[derive(Debug, Clone)]
struct CapturedRequest {
    path: String,
    body: Value,
}

/// Serve `responses` (one per connection, in order) and record each
/// request. Returns the base URL and the capture log.
async fn spawn_backend(responses: Vec<(u16, &'static str)>) -> (String, Arc<Mutex<Vec<CapturedRequest>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured = Arc::new(Mutex::new(Vec::new()));

    let log = captured.clone();
    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };

            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            // Read until the full body has arrived (Content-Length bytes
            // past the header terminator).
            loop {
                let n = match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };
                buf.extend_from_slice(&chunk[..n]);
                if let Some(header_end) = find_subslice(&buf, b"\r\n\r\n") {
                    let headers = String::from_utf8_lossy(&buf[..header_end]);
                    let content_length = headers
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if buf.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            if let Some(header_end) = find_subslice(&buf, b"\r\n\r\n") {
                let request_line = String::from_utf8_lossy(&buf)
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .to_string();
                let path = request_line
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or_default()
                    .to_string();
                let body_bytes = &buf[header_end + 4..];
                let body = serde_json::from_slice(body_bytes).unwrap_or(Value::Null);
                log.lock().unwrap().push(CapturedRequest { path, body });
            }

            let reason = if status == 200 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{}", addr), captured)
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn relay_for(base: &str) -> ConversationRelay {
    ConversationRelay::new(
        reqwest::Client::new(),
        format!("{}/api/ConductInterview/start", base),
        format!("{}/api/ConductInterview/conduct", base),
    )
}

fn ctx() -> SessionContext {
    SessionContext::new(
        "sess-42".to_string(),
        "Jane Doe".to_string(),
        "jane@example.com".to_string(),
    )
}

#[tokio::test]
async fn start_then_conduct_round_trip() {
    let (base, captured) = spawn_backend(vec![
        (200, r#"{"message":"Welcome, let's begin."}"#),
        (
            200,
            r#"{"aiResponse":"Why do you want this role?","currentQuestionIndex":1}"#,
        ),
    ])
    .await;
    let relay = relay_for(&base);

    let greeting = relay
        .start_session("sess-42", &["Tell me about yourself".to_string()])
        .await
        .unwrap();
    assert_eq!(greeting, "Welcome, let's begin.");

    let outcome = relay
        .send_answer(&ctx(), "I have five years of experience.")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        RelayOutcome::Delivered {
            prompt: Some("Why do you want this role?".to_string()),
            question_index: Some(1),
        }
    );

    let requests = captured.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);

    assert_eq!(requests[0].path, "/api/ConductInterview/start");
    assert_eq!(requests[0].body["sessionId"], "sess-42");
    assert_eq!(requests[0].body["questions"][0], "Tell me about yourself");

    assert_eq!(requests[1].path, "/api/ConductInterview/conduct");
    assert_eq!(requests[1].body["sessionId"], "sess-42");
    assert_eq!(
        requests[1].body["userAnswer"],
        "I have five years of experience."
    );
    assert_eq!(requests[1].body["candidateName"], "Jane Doe");
    assert_eq!(requests[1].body["candidateEmail"], "jane@example.com");
    // Elapsed-time label is MM:SS
    let time = requests[1].body["time"].as_str().unwrap();
    assert_eq!(time.len(), 5);
    assert_eq!(&time[2..3], ":");
}

#[tokio::test]
async fn duplicate_answer_never_reaches_the_backend() {
    // One canned response only: a second HTTP request would hang the test.
    let (base, captured) = spawn_backend(vec![(200, r#"{"aiResponse":"Next."}"#)]).await;
    let relay = relay_for(&base);
    let ctx = ctx();

    let first = relay.send_answer(&ctx, "same answer").await.unwrap();
    assert!(matches!(first, RelayOutcome::Delivered { .. }));

    let second = relay.send_answer(&ctx, "  same answer  ").await.unwrap();
    assert_eq!(second, RelayOutcome::Skipped(SkipReason::Duplicate));

    assert_eq!(captured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn server_error_surfaces_and_releases_the_relay() {
    let (base, captured) = spawn_backend(vec![
        (500, r#"{"error":"boom"}"#),
        (200, r#"{"aiResponse":"Recovered."}"#),
    ])
    .await;
    let relay = relay_for(&base);
    let ctx = ctx();

    let err = relay.send_answer(&ctx, "first attempt").await.unwrap_err();
    assert!(err.to_string().contains("Interview backend unavailable"));

    // The failed attempt must not be remembered as sent, and the in-flight
    // flag must be released, so the same text goes through on retry.
    let outcome = relay.send_answer(&ctx, "first attempt").await.unwrap();
    assert_eq!(
        outcome,
        RelayOutcome::Delivered {
            prompt: Some("Recovered.".to_string()),
            question_index: None,
        }
    );

    assert_eq!(captured.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn unreachable_backend_maps_to_relay_unavailable() {
    // Bind then drop to get a port nothing is listening on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let relay = relay_for(&format!("http://{}", addr));
    let err = relay.send_answer(&ctx(), "hello").await.unwrap_err();
    assert!(err.to_string().contains("Interview backend unavailable"));
}
