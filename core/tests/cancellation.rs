//! Cancellation over a real socket.
//!
//! A bare `TcpListener` plays the server so the test can observe the
//! connection itself: once the scope fires, the client must hang up rather
//! than wait for a response it will never use.

use std::sync::Arc;
use std::time::Duration;

use archestra_client::{ApiError, ArchestraClient, CancellationToken, CreateUser, ReqwestTransport};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};

fn new_user() -> CreateUser {
    CreateUser {
        email: "a@b".to_string(),
        name: "A".to_string(),
        email_verified: true,
        image: None,
        role: None,
        banned: false,
        ban_reason: None,
    }
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

/// Read one complete request (head plus body) off the stream.
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client hung up before the request was complete");
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).into_owned();
        if let Some(end) = text.find("\r\n\r\n") {
            if buf.len() >= end + 4 + content_length(&text[..end]) {
                return text;
            }
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelling_an_in_flight_request_closes_the_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let client = ArchestraClient::new(&format!("http://{addr}"), Arc::new(ReqwestTransport::new())).unwrap();
    let scope = CancellationToken::new();

    let call = tokio::spawn({
        let scope = scope.clone();
        async move { client.create_user(&scope, &new_user(), &[]).await }
    });

    let (mut stream, _) = listener.accept().await.unwrap();
    let request = read_request(&mut stream).await;
    assert!(request.starts_with("POST /v1/users "), "{request}");

    scope.cancel();
    let result = call.await.unwrap();
    assert!(matches!(result, Err(ApiError::Cancelled)));

    let mut rest = [0u8; 64];
    let read = tokio::time::timeout(Duration::from_secs(2), stream.read(&mut rest))
        .await
        .expect("client kept the connection open after cancellation");
    assert!(matches!(read, Ok(0) | Err(_)), "expected EOF, got {read:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelled_scope_never_opens_a_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let client = ArchestraClient::new(&format!("http://{addr}"), Arc::new(ReqwestTransport::new())).unwrap();
    let scope = CancellationToken::new();
    scope.cancel();

    let result = client.create_user(&scope, &new_user(), &[]).await;
    assert!(matches!(result, Err(ApiError::Cancelled)));

    let accepted = tokio::time::timeout(Duration::from_millis(200), listener.accept()).await;
    assert!(accepted.is_err(), "a connection was opened for a cancelled scope");
}
