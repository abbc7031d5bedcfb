//! Integration tests for the chatbot service client: reply parsing, error
//! detail extraction, and the liveness probe semantics, against a minimal
//! in-process HTTP listener.

use aiion::api::{ApiError, ChatApiClient, HistoryTurn};
use aiion::types::Role;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Serve every connection with a fixed response after reading the full
/// request. Returns the base URL. The listener task lives until the runtime
/// for the test shuts down.
async fn spawn_stub(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut tmp = [0u8; 1024];
                let (head_end, content_length) = loop {
                    let n = match socket.read(&mut tmp).await {
                        Ok(0) => return,
                        Ok(n) => n,
                        Err(_) => return,
                    };
                    buf.extend_from_slice(&tmp[..n]);
                    if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
                        let head = String::from_utf8_lossy(&buf[..pos]).into_owned();
                        let len = head
                            .lines()
                            .find_map(|line| {
                                let (name, value) = line.split_once(':')?;
                                if name.eq_ignore_ascii_case("content-length") {
                                    value.trim().parse::<usize>().ok()
                                } else {
                                    None
                                }
                            })
                            .unwrap_or(0);
                        break (pos + 4, len);
                    }
                };
                while buf.len() < head_end + content_length {
                    match socket.read(&mut tmp).await {
                        Ok(0) => break,
                        Ok(n) => buf.extend_from_slice(&tmp[..n]),
                        Err(_) => return,
                    }
                }
                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{addr}")
}

/// Accept connections but never answer; the probe runs into its timeout.
async fn spawn_silent_stub() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                // Hold the connection open until the peer gives up.
                let mut tmp = [0u8; 1024];
                while matches!(socket.read(&mut tmp).await, Ok(n) if n > 0) {}
            });
        }
    });
    format!("http://{addr}")
}

/// Answer one connection with 200 OK and hand back the request head.
async fn spawn_capturing_stub() -> (String, tokio::sync::oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut buf = Vec::new();
        let mut tmp = [0u8; 1024];
        while find_subsequence(&buf, b"\r\n\r\n").is_none() {
            match socket.read(&mut tmp).await {
                Ok(0) | Err(_) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
            }
        }
        let _ = socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}")
            .await;
        let _ = socket.shutdown().await;
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    (format!("http://{addr}"), rx)
}

/// A port that was just bound and released: connecting to it is refused.
async fn refused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[tokio::test]
async fn send_message_parses_reply_field() {
    let base = spawn_stub("200 OK", r#"{"message":"안녕하세요","model":"gpt-3.5-turbo"}"#).await;
    let client = ChatApiClient::new(base, None);
    let reply = client.send_message("안녕", &[], None, None).await.unwrap();
    assert_eq!(reply, "안녕하세요");
}

#[tokio::test]
async fn send_message_falls_back_to_response_field() {
    let base = spawn_stub("200 OK", r#"{"response":"대체 응답"}"#).await;
    let client = ChatApiClient::new(base, None);
    let history = vec![HistoryTurn {
        role: Role::User,
        content: "이전 질문".to_string(),
    }];
    let reply = client
        .send_message("다음 질문", &history, None, None)
        .await
        .unwrap();
    assert_eq!(reply, "대체 응답");
}

#[tokio::test]
async fn send_message_surfaces_structured_detail() {
    let base = spawn_stub(
        "500 Internal Server Error",
        r#"{"detail":"You exceeded your current quota"}"#,
    )
    .await;
    let client = ChatApiClient::new(base, None);
    let err = client.send_message("안녕", &[], None, None).await.unwrap_err();
    match err {
        ApiError::Status { status, detail } => {
            assert_eq!(status, 500);
            assert_eq!(detail.unwrap(), "You exceeded your current quota");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn health_probe_treats_any_response_as_alive() {
    let ok = spawn_stub("200 OK", r#"{"message":"pong"}"#).await;
    assert!(ChatApiClient::new(ok, None).check_health().await);

    // A 500 means the process answered; the service is reachable.
    let erroring = spawn_stub("500 Internal Server Error", r#"{"detail":"boom"}"#).await;
    assert!(ChatApiClient::new(erroring, None).check_health().await);
}

#[tokio::test]
async fn health_probe_timeout_still_counts_as_alive() {
    // The connection is accepted but never answered. Something is listening,
    // so the probe's own timeout does not mean the service is down.
    let base = spawn_silent_stub().await;
    assert!(ChatApiClient::new(base, None).check_health().await);
}

#[tokio::test]
async fn health_probe_carries_bearer_token() {
    let (base, head) = spawn_capturing_stub().await;
    let client = ChatApiClient::new(base, Some("token-123".to_string()));
    assert!(client.check_health().await);
    let head = head.await.unwrap().to_ascii_lowercase();
    assert!(head.contains("authorization: bearer token-123"));
}

#[tokio::test]
async fn health_probe_reports_connectivity_failures_as_down() {
    let base = refused_base_url().await;
    assert!(!ChatApiClient::new(base, None).check_health().await);
}

#[tokio::test]
async fn streaming_send_always_fails() {
    let client = ChatApiClient::new("http://localhost:9000", None);
    let err = client
        .send_message_stream("안녕", &[], |_chunk| {})
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::StreamingUnavailable));
}

#[tokio::test]
async fn conversation_passthroughs_follow_status() {
    let base = spawn_stub(
        "200 OK",
        r#"[{"role":"system","content":"prompt"},{"role":"user","content":"안녕"}]"#,
    )
    .await;
    let client = ChatApiClient::new(base, None);
    let messages = client.conversation("abc").await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "안녕");

    let missing = spawn_stub("404 Not Found", "{}").await;
    let client = ChatApiClient::new(missing, None);
    assert!(matches!(
        client.delete_conversation("abc").await,
        Err(ApiError::Status { status: 404, .. })
    ));
}
