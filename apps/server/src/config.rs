use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, Context};
use ppp_dictionaries::TinkoffInstrumentClass;
use reqwest::Url;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_PATH: &str = "./db/instruments.db";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Server configuration, read from `PPP_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    /// Remote functions endpoint holding the instrument and broker collections.
    pub remote_url: String,
    pub remote_api_key: Option<String>,
    /// Optional fetch relay for sources not reachable directly.
    pub service_machine_url: Option<Url>,
    pub tinkoff_classes: Vec<TinkoffInstrumentClass>,
    pub request_timeout: Duration,
    pub cors_allow_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();

        let listen_addr = env_or("PPP_LISTEN_ADDR", DEFAULT_LISTEN_ADDR)
            .parse::<SocketAddr>()
            .context("PPP_LISTEN_ADDR must be a socket address")?;

        let db_path = env_or("PPP_DB_PATH", DEFAULT_DB_PATH);

        let remote_url = env_opt("PPP_REMOTE_URL")
            .ok_or_else(|| anyhow!("PPP_REMOTE_URL is required"))?;
        Url::parse(&remote_url).context("PPP_REMOTE_URL must be an absolute URL")?;

        let service_machine_url = env_opt("PPP_SERVICE_MACHINE_URL")
            .map(|raw| Url::parse(&raw))
            .transpose()
            .context("PPP_SERVICE_MACHINE_URL must be an absolute URL")?;

        let tinkoff_classes = parse_classes(&env_or("PPP_TINKOFF_CLASSES", "Shares"))?;

        let request_timeout_ms = match env_opt("PPP_REQUEST_TIMEOUT_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("PPP_REQUEST_TIMEOUT_MS must be a number of milliseconds")?,
            None => DEFAULT_REQUEST_TIMEOUT_MS,
        };

        let cors_allow_origins = env_opt("PPP_CORS_ALLOW_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            listen_addr,
            db_path,
            remote_url,
            remote_api_key: env_opt("PPP_REMOTE_API_KEY"),
            service_machine_url,
            tinkoff_classes,
            request_timeout: Duration::from_millis(request_timeout_ms),
            cors_allow_origins,
        })
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn parse_classes(raw: &str) -> anyhow::Result<Vec<TinkoffInstrumentClass>> {
    let mut classes = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let class = part
            .parse::<TinkoffInstrumentClass>()
            .map_err(|e| anyhow!("PPP_TINKOFF_CLASSES: {}", e))?;
        if !classes.contains(&class) {
            classes.push(class);
        }
    }
    if classes.is_empty() {
        classes.push(TinkoffInstrumentClass::Shares);
    }
    Ok(classes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classes() {
        assert_eq!(
            parse_classes("Shares, etfs,Shares").unwrap(),
            vec![TinkoffInstrumentClass::Shares, TinkoffInstrumentClass::Etfs]
        );
        assert_eq!(parse_classes("").unwrap(), vec![TinkoffInstrumentClass::Shares]);
        assert!(parse_classes("Bonds").is_err());
    }
}
