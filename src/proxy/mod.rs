//! WebSocket reverse proxy core.
//!
//! Target rewriting, upgrade detection, backend dialing, the byte relay and
//! the orchestrator that ties them together per session.

pub mod bridge;
pub mod dialer;
pub mod error;
pub mod error_log;
pub mod rewrite;
pub mod upgrade;
pub mod websocket;

pub use bridge::{bridge, CompletionSignal, Direction, Relay};
pub use dialer::{dial_address, Dialer, TcpDialer};
pub use error::ProxyError;
pub use error_log::{ErrorLog, NoopErrorLog, TracingErrorLog};
pub use rewrite::{Rewriter, SingleHostRewriter};
pub use upgrade::is_websocket_request;
pub use websocket::WebSocketProxy;
