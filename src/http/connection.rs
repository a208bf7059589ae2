use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::TcpStream;

use crate::http::hijack::{HijackError, Hijacked, Hijacker, ResponseChannel};
use crate::http::parser::{parse_http_request, ParseError};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::MessageWriter;
use crate::proxy::WebSocketProxy;

/// Largest request head we buffer before giving up on the client.
const MAX_HEAD_SIZE: usize = 64 * 1024;

pub struct Connection<S = TcpStream> {
    /// `None` once the socket has been hijacked.
    stream: Option<S>,
    buffer: BytesMut,
    state: ConnectionState,
    proxy: Arc<WebSocketProxy>,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(MessageWriter, bool), // bool = keep_alive?
    Upgrading(Request),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(stream: S, proxy: Arc<WebSocketProxy>) -> Self {
        Self {
            stream: Some(stream),
            buffer: BytesMut::with_capacity(4096),
            state: ConnectionState::Reading,
            proxy,
        }
    }

    pub fn is_hijacked(&self) -> bool {
        self.stream.is_none()
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            self.state = match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => match self.read_request().await? {
                    Some(req) => ConnectionState::Processing(req),
                    None => ConnectionState::Closed,
                },

                ConnectionState::Processing(req) => {
                    if req.is_websocket_upgrade() {
                        ConnectionState::Upgrading(req)
                    } else {
                        tracing::debug!(
                            method = req.method.as_str(),
                            path = %req.uri.path,
                            "Rejecting non-websocket request"
                        );
                        let response = Response::bad_request("Expected a WebSocket upgrade request.\n");
                        ConnectionState::Writing(MessageWriter::response(&response), req.keep_alive())
                    }
                }

                ConnectionState::Writing(mut writer, keep_alive) => {
                    let Some(stream) = self.stream.as_mut() else {
                        break;
                    };
                    writer.write_to_stream(stream).await?;

                    if keep_alive {
                        ConnectionState::Reading
                    } else {
                        ConnectionState::Closed
                    }
                }

                ConnectionState::Upgrading(req) => {
                    let proxy = Arc::clone(&self.proxy);
                    proxy.handle(self, &req).await;

                    // Without a hijack the request/response cycle is still ours.
                    if !self.is_hijacked() && req.keep_alive() {
                        ConnectionState::Reading
                    } else {
                        ConnectionState::Closed
                    }
                }

                ConnectionState::Closed => break,
            };
        }

        Ok(())
    }

    pub async fn read_request(&mut self) -> anyhow::Result<Option<Request>> {
        loop {
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    self.buffer.advance(consumed);
                    return Ok(Some(request));
                }

                Err(ParseError::Incomplete) => {
                    if self.buffer.len() > MAX_HEAD_SIZE {
                        anyhow::bail!("request head too large");
                    }
                }

                Err(e) => {
                    return Err(anyhow::anyhow!("HTTP parse error: {:?}", e));
                }
            }

            let Some(stream) = self.stream.as_mut() else {
                return Ok(None);
            };
            let n = stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                // Client closed connection
                return Ok(None);
            }
        }
    }
}

#[async_trait]
impl<S> ResponseChannel for Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn respond(&mut self, response: Response) -> std::io::Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotConnected))?;
        MessageWriter::response(&response).write_to_stream(stream).await
    }

    fn hijacker(&mut self) -> Option<&mut dyn Hijacker> {
        Some(self)
    }
}

impl<S> Hijacker for Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn hijack(&mut self) -> Result<Hijacked, HijackError> {
        let stream = self.stream.take().ok_or(HijackError::AlreadyHijacked)?;
        Ok(Hijacked {
            io: Box::new(stream),
            buffered: self.buffer.split().freeze(),
        })
    }
}
