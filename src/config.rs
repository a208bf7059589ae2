use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Backend base URL, e.g. `http://127.0.0.1:9000/ws`
    pub target: String,
    /// Optional dial deadline in milliseconds. No deadline when absent.
    #[serde(default)]
    pub dial_timeout_ms: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_target() -> String {
    "http://127.0.0.1:9000".to_string()
}

impl Config {
    /// Loads from the YAML file named by `SENTINEL_CONFIG`, or from the
    /// `LISTEN` and `TARGET` environment variables when it is unset.
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = std::env::var("SENTINEL_CONFIG") {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path))?;
            return Self::from_yaml_str(&raw);
        }

        let listen_addr = std::env::var("LISTEN").unwrap_or_else(|_| default_listen_addr());
        let target = std::env::var("TARGET").unwrap_or_else(|_| default_target());

        let cfg = Self {
            server: ServerConfig { listen_addr },
            proxy: ProxyConfig {
                target,
                dial_timeout_ms: None,
            },
        };
        cfg.proxy.target_url()?;
        Ok(cfg)
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        let cfg: Self = serde_yaml::from_str(raw).context("parsing config")?;
        cfg.proxy.target_url()?;
        Ok(cfg)
    }
}

impl ProxyConfig {
    pub fn target_url(&self) -> anyhow::Result<Url> {
        let url = Url::parse(&self.target)
            .with_context(|| format!("invalid proxy target {:?}", self.target))?;
        if url.host_str().is_none() {
            anyhow::bail!("proxy target {:?} has no host", self.target);
        }
        Ok(url)
    }

    pub fn dial_timeout(&self) -> Option<Duration> {
        self.dial_timeout_ms.map(Duration::from_millis)
    }
}
