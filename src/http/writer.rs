use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::request::{Headers, Request};
use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

fn write_headers(buf: &mut Vec<u8>, headers: &Headers) {
    for (k, v) in headers.iter() {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }
}

pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    write_headers(&mut buf, &resp.headers);

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf.extend_from_slice(&resp.body);

    buf
}

/// Serializes a request for replay onto a backend connection.
///
/// Headers go out in their original order and casing. Hop-by-hop headers are
/// kept: a handshake without `Connection`/`Upgrade` is not a handshake.
pub fn serialize_request(req: &Request) -> Vec<u8> {
    let mut buf = Vec::new();

    let request_line = format!(
        "{} {} {}\r\n",
        req.method.as_str(),
        req.uri.path_and_query(),
        req.version
    );
    buf.extend_from_slice(request_line.as_bytes());

    let mut headers = req.headers.clone();
    if !headers.contains("Host") && !req.uri.host.is_empty() {
        headers.insert("Host", req.uri.host.as_str());
    }
    if !req.body.is_empty() && !headers.contains("Content-Length") {
        headers.insert("Content-Length", req.body.len().to_string());
    }
    write_headers(&mut buf, &headers);

    buf.extend_from_slice(b"\r\n");
    buf.extend_from_slice(&req.body);

    buf
}

/// A serialized HTTP message with write progress.
pub struct MessageWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl MessageWriter {
    pub fn response(response: &Response) -> Self {
        Self::from_bytes(serialize_response(response))
    }

    pub fn from_bytes(buffer: Vec<u8>) -> Self {
        Self { buffer, written: 0 }
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "connection closed while writing",
                ));
            }

            self.written += n;
        }

        stream.flush().await
    }
}
