//! Integration tests for the streaming transcription session against a
//! local WebSocket server.

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use viva::audio::AudioFrame;
use viva::transcribe::session::{StreamEvent, TranscriptionSession};

#[tokio::test]
async fn fragments_flow_in_and_frames_flow_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (seen_tx, mut seen_rx) = mpsc::channel::<String>(4);
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(socket).await.unwrap();

        ws.send(Message::Text(
            r#"{"transcript":"hello there","end_of_turn":false}"#.into(),
        ))
        .await
        .unwrap();
        ws.send(Message::Text(
            r#"{"transcript":"hello there.","end_of_turn":true}"#.into(),
        ))
        .await
        .unwrap();

        // First inbound text message is the audio payload.
        while let Some(Ok(message)) = ws.next().await {
            if let Message::Text(raw) = message {
                let _ = seen_tx.send(raw.to_string()).await;
                break;
            }
        }
        let _ = ws.send(Message::Close(None)).await;
    });

    let (handle, mut events) =
        TranscriptionSession::open(&format!("ws://{}", addr), "test-token")
            .await
            .unwrap();

    let first = events.recv().await.unwrap();
    match first {
        StreamEvent::Fragment(fragment) => {
            assert_eq!(fragment.text, "hello there");
            assert!(!fragment.is_final);
        }
        other => panic!("expected interim fragment, got {:?}", other),
    }

    let second = events.recv().await.unwrap();
    match second {
        StreamEvent::Fragment(fragment) => {
            assert_eq!(fragment.text, "hello there.");
            assert!(fragment.is_final);
        }
        other => panic!("expected final fragment, got {:?}", other),
    }

    let frame = AudioFrame::new(0, vec![1, -2, 3, -4]);
    handle.send_frame(&frame);

    let raw = seen_rx.recv().await.unwrap();
    let payload: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(payload["audio_data"], frame.to_base64());

    // Server close ends the stream with a Closed event.
    assert_eq!(events.recv().await.unwrap(), StreamEvent::Closed);
}

#[tokio::test]
async fn url_carries_sample_rate_and_token() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (path_tx, mut path_rx) = mpsc::channel::<String>(1);
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let ws = accept_async_with_path(socket, path_tx).await;
        drop(ws);
    });

    let (_handle, _events) =
        TranscriptionSession::open(&format!("ws://{}", addr), "tok-123")
            .await
            .unwrap();

    let path = path_rx.recv().await.unwrap();
    assert_eq!(path, "/?sample_rate=16000&token=tok-123");
}

/// Accept a WebSocket connection, reporting the request path.
async fn accept_async_with_path(
    socket: tokio::net::TcpStream,
    path_tx: mpsc::Sender<String>,
) -> tokio_tungstenite::WebSocketStream<tokio::net::TcpStream> {
    use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
    tokio_tungstenite::accept_hdr_async(socket, move |request: &Request, response: Response| {
        let _ = path_tx.try_send(request.uri().to_string());
        Ok(response)
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn http_rejection_maps_to_auth_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        // Refuse the upgrade outright; 4xx during the handshake means the
        // token was bad.
        let _ = socket
            .write_all(b"HTTP/1.1 401 Unauthorized\r\ncontent-length: 0\r\n\r\n")
            .await;
        let _ = socket.shutdown().await;
    });

    let err = TranscriptionSession::open(&format!("ws://{}", addr), "expired")
        .await
        .unwrap_err();
    assert!(
        err.to_string().contains("rejected credentials"),
        "expected auth rejection, got: {}",
        err
    );
}

#[tokio::test]
async fn connection_refused_maps_to_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = TranscriptionSession::open(&format!("ws://{}", addr), "token")
        .await
        .unwrap_err();
    assert!(
        err.to_string().contains("Streaming connection failed"),
        "expected connection failure, got: {}",
        err
    );
}

#[tokio::test]
async fn client_close_reaches_the_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (closed_tx, mut closed_rx) = mpsc::channel::<bool>(1);
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(socket).await.unwrap();
        let mut saw_close = false;
        while let Some(Ok(message)) = ws.next().await {
            if matches!(message, Message::Close(_)) {
                saw_close = true;
                break;
            }
        }
        let _ = closed_tx.send(saw_close).await;
    });

    let (handle, _events) =
        TranscriptionSession::open(&format!("ws://{}", addr), "token")
            .await
            .unwrap();

    assert!(handle.is_open());
    handle.close();
    assert!(!handle.is_open());

    assert!(closed_rx.recv().await.unwrap());
}
