//! Tests for the WebSocket proxy session lifecycle

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{HANDSHAKE, HangingDialer, MockChannel, MockDialer, RecordingLog, handshake_request};
use sentinel_ws::http::request::Request;
use sentinel_ws::http::response::StatusCode;
use sentinel_ws::proxy::{Direction, ProxyError, WebSocketProxy};
use sentinel_ws::server::listener;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use url::Url;

fn target(raw: &str) -> Url {
    Url::parse(raw).unwrap()
}

#[tokio::test]
async fn test_end_to_end_echo_through_tcp() {
    // Backend echoes every byte and reports how many it saw once the proxy closes it.
    let backend = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend_addr = backend.local_addr().unwrap();
    let (closed_tx, closed_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let (mut socket, _) = backend.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let mut total = 0;
        loop {
            let n = socket.read(&mut buf).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            total += n;
            if socket.write_all(&buf[..n]).await.is_err() {
                break;
            }
        }
        let _ = closed_tx.send(total);
    });

    let front = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let front_addr = front.local_addr().unwrap();
    let proxy = WebSocketProxy::single_host(&target(&format!("http://{}", backend_addr)));
    tokio::spawn(listener::serve(front, Arc::new(proxy)));

    let payload: &[u8] = b"\x81\x05hello arbitrary \x00\xff bytes";
    let mut client = TcpStream::connect(front_addr).await.unwrap();
    client.write_all(HANDSHAKE).await.unwrap();
    client.write_all(payload).await.unwrap();

    let mut echoed = vec![0u8; HANDSHAKE.len() + payload.len()];
    timeout(Duration::from_secs(5), client.read_exact(&mut echoed))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&echoed[..HANDSHAKE.len()], HANDSHAKE);
    assert_eq!(&echoed[HANDSHAKE.len()..], payload);

    client.shutdown().await.unwrap();

    let seen = timeout(Duration::from_secs(5), closed_rx).await.unwrap().unwrap();
    assert_eq!(seen, HANDSHAKE.len() + payload.len());

    let mut rest = Vec::new();
    let n = timeout(Duration::from_secs(5), client.read_to_end(&mut rest))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn test_non_upgrade_request_rejected_by_server() {
    let front = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let front_addr = front.local_addr().unwrap();
    let dialer = MockDialer::refusing();
    let proxy = WebSocketProxy::single_host(&target("http://127.0.0.1:1")).with_dialer(dialer.clone());
    tokio::spawn(listener::serve(front, Arc::new(proxy)));

    let mut client = TcpStream::connect(front_addr).await.unwrap();
    client
        .write_all(b"GET / HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut out = Vec::new();
    timeout(Duration::from_secs(5), client.read_to_end(&mut out))
        .await
        .unwrap()
        .unwrap();

    assert!(String::from_utf8_lossy(&out).starts_with("HTTP/1.1 400 Bad Request"));
    assert!(dialer.dialed_addrs().is_empty());
}

#[tokio::test]
async fn test_dial_failure_responds_500_without_hijack() {
    let log = RecordingLog::default();
    let proxy = WebSocketProxy::single_host(&target("http://backend.invalid"))
        .with_dialer(MockDialer::refusing())
        .with_error_log(log.clone());
    let (mut channel, _client) = MockChannel::new();

    proxy.handle(&mut channel, &handshake_request("/chat")).await;

    assert_eq!(channel.responses.len(), 1);
    assert_eq!(channel.responses[0].status, StatusCode::InternalServerError);
    assert_eq!(channel.responses[0].body, b"Error forwarding request.".to_vec());
    assert_eq!(channel.hijack_attempts, 0);
    assert!(channel.socket.is_some());

    let lines = log.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("error dialing websocket backend http://backend.invalid/chat"));
}

#[tokio::test]
async fn test_dial_failure_over_tcp_keeps_http_cycle() {
    let front = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let front_addr = front.local_addr().unwrap();
    let proxy = WebSocketProxy::single_host(&target("http://127.0.0.1:1"))
        .with_dialer(MockDialer::refusing())
        .with_error_log(RecordingLog::default());
    tokio::spawn(listener::serve(front, Arc::new(proxy)));

    let mut client = TcpStream::connect(front_addr).await.unwrap();
    client.write_all(HANDSHAKE).await.unwrap();
    let mut out = Vec::new();
    timeout(Duration::from_secs(5), client.read_to_end(&mut out))
        .await
        .unwrap()
        .unwrap();

    let text = String::from_utf8_lossy(&out);
    assert!(text.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(text.ends_with("Error forwarding request."));
}

#[tokio::test]
async fn test_default_port_appended_when_missing() {
    let dialer = MockDialer::refusing();
    let proxy = WebSocketProxy::single_host(&target("http://example.com/base"))
        .with_dialer(dialer.clone())
        .with_error_log(RecordingLog::default());
    let (mut channel, _client) = MockChannel::new();

    proxy.handle(&mut channel, &handshake_request("/x")).await;

    assert_eq!(dialer.dialed_addrs(), vec!["example.com:80".to_string()]);
    assert_eq!(dialer.dialed.lock().unwrap()[0].0, "tcp");
}

#[tokio::test]
async fn test_explicit_port_kept() {
    let dialer = MockDialer::refusing();
    let proxy = WebSocketProxy::single_host(&target("https://example.com:9000"))
        .with_dialer(dialer.clone())
        .with_error_log(RecordingLog::default());
    let (mut channel, _client) = MockChannel::new();

    proxy.handle(&mut channel, &handshake_request("/x")).await;

    assert_eq!(dialer.dialed_addrs(), vec!["example.com:9000".to_string()]);
}

#[tokio::test]
async fn test_secure_scheme_still_defaults_to_port_80() {
    let dialer = MockDialer::refusing();
    let proxy = WebSocketProxy::single_host(&target("wss://example.com"))
        .with_dialer(dialer.clone())
        .with_error_log(RecordingLog::default());
    let (mut channel, _client) = MockChannel::new();

    proxy.handle(&mut channel, &handshake_request("/")).await;

    assert_eq!(dialer.dialed_addrs(), vec!["example.com:80".to_string()]);
}

#[tokio::test]
async fn test_hijack_unsupported_responds_500() {
    let (dialer, mut backend) = MockDialer::with_backend();
    let log = RecordingLog::default();
    let proxy = WebSocketProxy::single_host(&target("http://backend:9000"))
        .with_dialer(dialer)
        .with_error_log(log.clone());
    let (mut channel, _client) = MockChannel::without_hijack();

    let result = proxy.proxy(&mut channel, &handshake_request("/chat")).await;

    assert!(matches!(result, Err(ProxyError::HijackUnsupported)));
    assert_eq!(channel.responses.len(), 1);
    assert_eq!(channel.responses[0].status, StatusCode::InternalServerError);

    // The dialed backend was released without anything written to it.
    let mut out = Vec::new();
    backend.read_to_end(&mut out).await.unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_hijack_failure_is_logged_without_response() {
    let (dialer, _backend) = MockDialer::with_backend();
    let log = RecordingLog::default();
    let proxy = WebSocketProxy::single_host(&target("http://backend:9000"))
        .with_dialer(dialer)
        .with_error_log(log.clone());
    let (mut channel, _client) = MockChannel::new();
    channel.socket = None;

    proxy.handle(&mut channel, &handshake_request("/chat")).await;

    assert!(channel.responses.is_empty());
    assert_eq!(channel.hijack_attempts, 1);
    assert_eq!(log.lines(), vec!["hijack error: connection has already been hijacked".to_string()]);
}

#[tokio::test]
async fn test_forward_failure_releases_client() {
    let (dialer, backend) = MockDialer::with_backend();
    drop(backend);
    let log = RecordingLog::default();
    let proxy = WebSocketProxy::single_host(&target("http://backend:9000"))
        .with_dialer(dialer)
        .with_error_log(log.clone());
    let (mut channel, mut client) = MockChannel::new();

    proxy.handle(&mut channel, &handshake_request("/chat")).await;

    assert!(channel.responses.is_empty());
    let lines = log.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("error copying request to target"));

    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_rewritten_request_and_buffered_bytes_reach_backend() {
    let (dialer, mut backend) = MockDialer::with_backend();
    let proxy = WebSocketProxy::single_host(&target("http://backend:9000/api/?token=t"))
        .with_dialer(dialer.clone());
    let (mut channel, mut client) = MockChannel::new();
    channel.buffered = bytes::Bytes::from_static(b"\x81\x01a");

    let session = tokio::spawn(async move {
        let result = proxy.proxy(&mut channel, &handshake_request("/chat?room=1")).await;
        (result, channel)
    });

    let expected: &[u8] = b"GET /api/chat?token=t&room=1 HTTP/1.1\r\nHost: front.example\r\nConnection: Upgrade\r\nUpgrade: websocket\r\n\r\n\x81\x01a";
    let mut forwarded = vec![0u8; expected.len()];
    backend.read_exact(&mut forwarded).await.unwrap();
    assert_eq!(forwarded, expected);

    backend.write_all(b"HTTP/1.1 101 Switching Protocols\r\n\r\n").await.unwrap();
    let mut reply = vec![0u8; 36];
    client.read_exact(&mut reply).await.unwrap();
    assert_eq!(&reply[..], b"HTTP/1.1 101 Switching Protocols\r\n\r\n");

    // Backend hangs up first; the session ends without waiting on the client.
    drop(backend);
    let (result, channel) = timeout(Duration::from_secs(5), session).await.unwrap().unwrap();
    let signal = result.unwrap();
    assert_eq!(signal.direction, Direction::BackendToClient);
    assert!(signal.result.is_ok());
    assert!(channel.responses.is_empty());
    assert_eq!(dialer.dialed_addrs(), vec!["backend:9000".to_string()]);

    let mut rest = Vec::new();
    client.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
}

#[tokio::test]
async fn test_custom_rewriter_closure() {
    let dialer = MockDialer::refusing();
    let proxy = WebSocketProxy::new(|req: &mut Request| {
        req.uri.host = "shard-3.internal:7000".to_string();
        req.uri.path = format!("/v2{}", req.uri.path);
    })
    .with_dialer(dialer.clone())
    .with_error_log(RecordingLog::default());
    let (mut channel, _client) = MockChannel::new();

    let result = proxy.proxy(&mut channel, &handshake_request("/feed")).await;

    match result {
        Err(ProxyError::Dial { url, addr, .. }) => {
            assert_eq!(addr, "shard-3.internal:7000");
            assert!(url.ends_with("/v2/feed"));
        }
        other => panic!("expected dial error, got {:?}", other.map(|s| s.direction)),
    }
}

#[tokio::test]
async fn test_rewriting_leaves_original_request_untouched() {
    let proxy = WebSocketProxy::single_host(&target("http://backend:9000/prefix"))
        .with_dialer(MockDialer::refusing())
        .with_error_log(RecordingLog::default());
    let request = handshake_request("/chat?x=1");
    let (mut channel, _client) = MockChannel::new();

    proxy.handle(&mut channel, &request).await;

    assert_eq!(request.uri.host, "front.example");
    assert_eq!(request.uri.path, "/chat");
    assert_eq!(request.uri.query, "x=1");
}

#[tokio::test]
async fn test_dial_timeout_is_opt_in() {
    let log = RecordingLog::default();
    let proxy = WebSocketProxy::single_host(&target("http://backend:9000"))
        .with_dialer(HangingDialer)
        .with_dial_timeout(Duration::from_millis(50))
        .with_error_log(log.clone());
    let (mut channel, _client) = MockChannel::new();

    let result = timeout(
        Duration::from_secs(5),
        proxy.proxy(&mut channel, &handshake_request("/")),
    )
    .await
    .unwrap();

    match result {
        Err(ProxyError::Dial { source, .. }) => {
            assert_eq!(source.kind(), std::io::ErrorKind::TimedOut)
        }
        _ => panic!("expected dial timeout"),
    }
    assert_eq!(channel.responses[0].status, StatusCode::InternalServerError);
}
