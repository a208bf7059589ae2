use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::http::connection::Connection;
use crate::proxy::WebSocketProxy;

pub async fn run(listen_addr: &str, proxy: Arc<WebSocketProxy>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen_addr).await?;
    serve(listener, proxy).await
}

/// Accepts connections forever, one task per client.
pub async fn serve(listener: TcpListener, proxy: Arc<WebSocketProxy>) -> anyhow::Result<()> {
    info!("Listening on {}", listener.local_addr()?);

    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);

        let proxy = Arc::clone(&proxy);
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, proxy);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
