//! Ownership transfer of a client socket.
//!
//! A [`ResponseChannel`] is whatever the proxy answers a request through.
//! Channels that own a raw socket also expose a [`Hijacker`]; after a
//! successful hijack the channel never touches the socket again and the
//! caller is responsible for closing it.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::http::response::Response;

/// A duplex byte stream the proxy can own.
pub trait Io: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> Io for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

pub type BoxedIo = Box<dyn Io>;

#[derive(Debug, Error)]
pub enum HijackError {
    #[error("connection has already been hijacked")]
    AlreadyHijacked,
    #[error("connection is closed")]
    Closed,
}

/// A socket taken over from the serving connection.
pub struct Hijacked {
    pub io: BoxedIo,
    /// Bytes the server had already read past the end of the request.
    pub buffered: Bytes,
}

impl std::fmt::Debug for Hijacked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hijacked")
            .field("buffered", &self.buffered.len())
            .finish_non_exhaustive()
    }
}

pub trait Hijacker: Send {
    fn hijack(&mut self) -> Result<Hijacked, HijackError>;
}

#[async_trait]
pub trait ResponseChannel: Send {
    /// Writes a complete HTTP response to the client.
    async fn respond(&mut self, response: Response) -> std::io::Result<()>;

    /// `None` when the transport cannot hand over its socket.
    fn hijacker(&mut self) -> Option<&mut dyn Hijacker>;
}
