//! Mock transports shared by the proxy tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use sentinel_ws::http::hijack::{BoxedIo, HijackError, Hijacked, Hijacker, ResponseChannel};
use sentinel_ws::http::request::{Method, Request, RequestBuilder};
use sentinel_ws::http::response::Response;
use sentinel_ws::proxy::{Dialer, ErrorLog, ProxyError};
use tokio::io::DuplexStream;

pub const HANDSHAKE: &[u8] =
    b"GET /chat HTTP/1.1\r\nHost: front.example\r\nConnection: Upgrade\r\nUpgrade: websocket\r\n\r\n";

pub fn handshake_request(target: &str) -> Request {
    RequestBuilder::new()
        .method(Method::GET)
        .target(target)
        .header("Host", "front.example")
        .header("Connection", "Upgrade")
        .header("Upgrade", "websocket")
        .build()
        .unwrap()
}

/// Response channel backed by an in-memory socket.
pub struct MockChannel {
    pub responses: Vec<Response>,
    pub socket: Option<DuplexStream>,
    pub buffered: Bytes,
    pub supports_hijack: bool,
    pub hijack_attempts: usize,
}

impl MockChannel {
    /// Returns the channel and the client's end of its socket.
    pub fn new() -> (Self, DuplexStream) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let channel = Self {
            responses: Vec::new(),
            socket: Some(server),
            buffered: Bytes::new(),
            supports_hijack: true,
            hijack_attempts: 0,
        };
        (channel, client)
    }

    pub fn without_hijack() -> (Self, DuplexStream) {
        let (mut channel, client) = Self::new();
        channel.supports_hijack = false;
        (channel, client)
    }
}

#[async_trait]
impl ResponseChannel for MockChannel {
    async fn respond(&mut self, response: Response) -> std::io::Result<()> {
        self.responses.push(response);
        Ok(())
    }

    fn hijacker(&mut self) -> Option<&mut dyn Hijacker> {
        if self.supports_hijack { Some(self) } else { None }
    }
}

impl Hijacker for MockChannel {
    fn hijack(&mut self) -> Result<Hijacked, HijackError> {
        self.hijack_attempts += 1;
        let socket = self.socket.take().ok_or(HijackError::AlreadyHijacked)?;
        Ok(Hijacked {
            io: Box::new(socket),
            buffered: std::mem::take(&mut self.buffered),
        })
    }
}

/// Dialer that records every address and hands out one prepared stream.
#[derive(Clone, Default)]
pub struct MockDialer {
    pub dialed: Arc<Mutex<Vec<(String, String)>>>,
    stream: Arc<Mutex<Option<DuplexStream>>>,
}

impl MockDialer {
    /// Returns the dialer and the backend's end of the stream it hands out.
    pub fn with_backend() -> (Self, DuplexStream) {
        let (proxy_side, backend_side) = tokio::io::duplex(64 * 1024);
        let dialer = Self {
            dialed: Arc::default(),
            stream: Arc::new(Mutex::new(Some(proxy_side))),
        };
        (dialer, backend_side)
    }

    /// A dialer whose every dial is refused.
    pub fn refusing() -> Self {
        Self::default()
    }

    pub fn dialed_addrs(&self) -> Vec<String> {
        self.dialed.lock().unwrap().iter().map(|(_, a)| a.clone()).collect()
    }
}

#[async_trait]
impl Dialer for MockDialer {
    async fn dial(&self, network: &str, addr: &str) -> std::io::Result<BoxedIo> {
        self.dialed
            .lock()
            .unwrap()
            .push((network.to_string(), addr.to_string()));
        match self.stream.lock().unwrap().take() {
            Some(stream) => Ok(Box::new(stream)),
            None => Err(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)),
        }
    }
}

/// Dialer that never completes.
pub struct HangingDialer;

#[async_trait]
impl Dialer for HangingDialer {
    async fn dial(&self, _network: &str, _addr: &str) -> std::io::Result<BoxedIo> {
        std::future::pending().await
    }
}

/// Error log that keeps every line.
#[derive(Clone, Default)]
pub struct RecordingLog {
    pub lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl ErrorLog for RecordingLog {
    fn log(&self, error: &ProxyError) {
        self.lines.lock().unwrap().push(error.to_string());
    }
}
