//! HTTP/1.1 front end.
//!
//! Only the handshake is HTTP here: once a WebSocket upgrade request has been
//! parsed the socket is hijacked and the proxy relays raw bytes.
//!
//! - **`connection`**: per-client state machine, implements [`hijack::ResponseChannel`]
//! - **`hijack`**: ownership transfer of the client socket
//! - **`parser`**: parses request heads from byte buffers
//! - **`request`**: request, method and header types
//! - **`response`**: response type with builder
//! - **`uri`**: request target split into scheme/host/path/query
//! - **`writer`**: serializes requests and responses onto a stream
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               │ Request received
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← WebSocket upgrade?
//!        └──────┬───────────┘
//!     no        │        yes
//!      ▼        │         ▼
//!   Writing 400 │     Upgrading ← proxy hijacks the socket
//!      │        │         │
//!      └─ Keep-Alive → Reading, otherwise Closed
//! ```

pub mod connection;
pub mod hijack;
pub mod parser;
pub mod request;
pub mod response;
pub mod uri;
pub mod writer;
