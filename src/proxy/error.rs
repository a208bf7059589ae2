use thiserror::Error;

use crate::http::hijack::HijackError;

/// Reasons a proxied WebSocket session failed to start.
///
/// None of these are retried. The `Display` output is the log line.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Backend unreachable. The client gets a 500.
    #[error("error dialing websocket backend {url} ({addr}): {source}")]
    Dial {
        url: String,
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The transport cannot hand over its socket. The client gets a 500.
    #[error("transport does not support connection hijacking")]
    HijackUnsupported,

    /// Taking over the socket failed; the response channel is no longer usable.
    #[error("hijack error: {0}")]
    Hijack(#[from] HijackError),

    /// Replaying the rewritten request onto the backend failed.
    #[error("error copying request to target: {0}")]
    Forward(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProxyError>;
