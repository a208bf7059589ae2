use crate::proxy::error::ProxyError;

/// Where the proxy reports failed sessions.
pub trait ErrorLog: Send + Sync {
    fn log(&self, error: &ProxyError);
}

/// Reports through `tracing` at error level. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorLog;

impl ErrorLog for TracingErrorLog {
    fn log(&self, error: &ProxyError) {
        tracing::error!(error = %error, "WebSocket proxy error");
    }
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopErrorLog;

impl ErrorLog for NoopErrorLog {
    fn log(&self, _error: &ProxyError) {}
}
