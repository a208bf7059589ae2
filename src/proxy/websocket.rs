//! WebSocket reverse proxy.
//!
//! Works only for WebSocket handshakes: callers are expected to check
//! [`is_websocket_request`](crate::proxy::upgrade::is_websocket_request)
//! before handing a request over.
//!
//! # Session lifecycle
//! ```text
//! rewrite → dial ─┬─ fail → 500 to client
//!                 └─ hijack ─┬─ unsupported → 500 to client
//!                            ├─ fail → log only
//!                            └─ forward request ─┬─ fail → log only
//!                                                └─ bridge → close both
//! ```
//! Once the socket is hijacked every exit path drops both streams.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use url::Url;

use crate::http::hijack::{BoxedIo, Hijacked, ResponseChannel};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::{serialize_request, MessageWriter};
use crate::proxy::bridge::{bridge, CompletionSignal};
use crate::proxy::dialer::{dial_address, Dialer, TcpDialer};
use crate::proxy::error::{ProxyError, Result};
use crate::proxy::error_log::{ErrorLog, TracingErrorLog};
use crate::proxy::rewrite::{Rewriter, SingleHostRewriter};

const DIAL_FAILED_BODY: &str = "Error forwarding request.";
const NOT_A_HIJACKER_BODY: &str = "Not a hijacker?";

/// Proxy configuration and per-session orchestration.
///
/// Immutable once built and shared read-only between sessions.
pub struct WebSocketProxy {
    rewriter: Arc<dyn Rewriter>,
    dialer: Arc<dyn Dialer>,
    error_log: Arc<dyn ErrorLog>,
    /// No deadline unless set.
    dial_timeout: Option<Duration>,
}

impl WebSocketProxy {
    pub fn new(rewriter: impl Rewriter + 'static) -> Self {
        Self {
            rewriter: Arc::new(rewriter),
            dialer: Arc::new(TcpDialer),
            error_log: Arc::new(TracingErrorLog),
            dial_timeout: None,
        }
    }

    /// Proxy for a single backend. Paths follow the same rules as
    /// [`SingleHostRewriter`]: target `/foo` plus inbound `/bar` is `/foo/bar`.
    pub fn single_host(target: &Url) -> Self {
        Self::new(SingleHostRewriter::new(target))
    }

    pub fn with_dialer(mut self, dialer: impl Dialer + 'static) -> Self {
        self.dialer = Arc::new(dialer);
        self
    }

    pub fn with_error_log(mut self, error_log: impl ErrorLog + 'static) -> Self {
        self.error_log = Arc::new(error_log);
        self
    }

    pub fn with_dial_timeout(mut self, dial_timeout: Duration) -> Self {
        self.dial_timeout = Some(dial_timeout);
        self
    }

    /// Proxies one handshake and its connection, reporting failures to the
    /// configured [`ErrorLog`].
    pub async fn handle<C>(&self, channel: &mut C, request: &Request)
    where
        C: ResponseChannel + ?Sized,
    {
        if let Err(e) = self.proxy(channel, request).await {
            self.error_log.log(&e);
        }
    }

    /// Runs a session to completion and returns how the relay ended.
    pub async fn proxy<C>(&self, channel: &mut C, request: &Request) -> Result<CompletionSignal>
    where
        C: ResponseChannel + ?Sized,
    {
        let mut outreq = request.clone();
        self.rewriter.rewrite(&mut outreq);

        let addr = dial_address(&outreq.uri.host);
        let backend = match self.dial(&addr).await {
            Ok(backend) => backend,
            Err(source) => {
                Self::reply_error(channel, DIAL_FAILED_BODY).await;
                return Err(ProxyError::Dial {
                    url: outreq.uri.to_string(),
                    addr,
                    source,
                });
            }
        };

        tracing::debug!(backend = %addr, path = %outreq.uri.path, "Dialed websocket backend");

        let Hijacked { io: client, buffered } = match channel.hijacker().map(|h| h.hijack()) {
            Some(Ok(hijacked)) => hijacked,
            Some(Err(e)) => return Err(e.into()),
            None => {
                Self::reply_error(channel, NOT_A_HIJACKER_BODY).await;
                return Err(ProxyError::HijackUnsupported);
            }
        };

        let mut backend = backend;
        let mut payload = serialize_request(&outreq);
        payload.extend_from_slice(&buffered);
        MessageWriter::from_bytes(payload)
            .write_to_stream(&mut backend)
            .await
            .map_err(ProxyError::Forward)?;

        tracing::debug!(backend = %addr, "Forwarded handshake, relaying");

        let (signal, relay) = bridge(client, backend).await;
        relay.close();

        Ok(signal)
    }

    async fn dial(&self, addr: &str) -> std::io::Result<BoxedIo> {
        let dial = self.dialer.dial("tcp", addr);
        match self.dial_timeout {
            Some(limit) => timeout(limit, dial).await.map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::TimedOut, "dial timed out")
            })?,
            None => dial.await,
        }
    }

    async fn reply_error<C>(channel: &mut C, body: &str)
    where
        C: ResponseChannel + ?Sized,
    {
        if let Err(e) = channel.respond(Response::internal_error(body)).await {
            tracing::debug!(error = %e, "Failed to write error response");
        }
    }
}
