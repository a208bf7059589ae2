//! Sentinel WS - WebSocket reverse proxy
//!
//! Parses the upgrade handshake, rewrites its target onto a backend, then
//! hijacks the client socket and relays raw bytes in both directions.

pub mod config;
pub mod http;
pub mod proxy;
pub mod server;
