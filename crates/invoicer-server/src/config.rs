use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub index_html: PathBuf,
    pub oracle_url: String,
    pub oracle_timeout: Duration,
    /// External key generator command line. `None` uses the built-in generator.
    pub keygen_cmd: Option<String>,
    pub keygen_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());
        let millis = |key: &str, default: &str| -> Result<Duration> {
            let raw = var(key, default);
            let ms: u64 = raw
                .parse()
                .with_context(|| format!("{key} must be a number of milliseconds, got {raw:?}"))?;
            Ok(Duration::from_millis(ms))
        };

        let port = var("INVOICER_PORT", "4444");
        let port: u16 = port
            .parse()
            .with_context(|| format!("INVOICER_PORT must be a port number, got {port:?}"))?;

        Ok(Self {
            host: var("INVOICER_HOST", "0.0.0.0"),
            port,
            static_dir: var("INVOICER_STATIC_DIR", "./dist").into(),
            index_html: var("INVOICER_INDEX_HTML", "./index.html").into(),
            oracle_url: var("INVOICER_ORACLE_URL", "http://127.0.0.1:8080/balance"),
            oracle_timeout: millis("INVOICER_ORACLE_TIMEOUT_MS", "5000")?,
            keygen_cmd: lookup("INVOICER_KEYGEN_CMD").filter(|cmd| !cmd.trim().is_empty()),
            keygen_timeout: millis("INVOICER_KEYGEN_TIMEOUT_MS", "10000")?,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
