use crate::http::request::Headers;

/// Whether the headers carry a WebSocket handshake.
///
/// Only the first value of each header is looked at and it must match
/// exactly, ignoring ASCII case. A token list such as
/// `Connection: keep-alive, Upgrade` is not treated as an upgrade.
pub fn is_websocket_request(headers: &Headers) -> bool {
    let connection = headers.get("Connection").unwrap_or_default();
    if !connection.eq_ignore_ascii_case("upgrade") {
        return false;
    }

    let upgrade = headers.get("Upgrade").unwrap_or_default();
    upgrade.eq_ignore_ascii_case("websocket")
}
