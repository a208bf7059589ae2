//! Backend connection establishment.

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::http::hijack::BoxedIo;

/// Port appended to a backend host that does not name one.
pub const DEFAULT_PORT: u16 = 80;

/// Opens a byte stream to a backend.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, network: &str, addr: &str) -> std::io::Result<BoxedIo>;
}

/// Plain TCP dialer, the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

#[async_trait]
impl Dialer for TcpDialer {
    async fn dial(&self, network: &str, addr: &str) -> std::io::Result<BoxedIo> {
        if network != "tcp" {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("unsupported network {:?}", network),
            ));
        }

        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Box::new(stream))
    }
}

/// Address to dial for a rewritten host.
///
/// The scheme is not consulted: a host without a port always gets `:80`.
pub fn dial_address(host: &str) -> String {
    let has_port = match host.strip_prefix('[') {
        // IPv6 literal: the port follows the closing bracket
        Some(rest) => rest.contains("]:"),
        None => host.contains(':'),
    };

    if has_port {
        host.to_string()
    } else {
        format!("{}:{}", host, DEFAULT_PORT)
    }
}
