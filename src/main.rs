use std::sync::Arc;

use sentinel_ws::config::Config;
use sentinel_ws::proxy::WebSocketProxy;
use sentinel_ws::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let target = cfg.proxy.target_url()?;

    let mut proxy = WebSocketProxy::single_host(&target);
    if let Some(limit) = cfg.proxy.dial_timeout() {
        proxy = proxy.with_dial_timeout(limit);
    }
    tracing::info!(backend = %target, "Proxying WebSocket upgrades");

    tokio::select! {
        res = server::listener::run(&cfg.server.listen_addr, Arc::new(proxy)) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
