use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Ten years.
const MAX_TOKEN_TTL_DAYS: i64 = 3650;

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub busy_timeout: Duration,
    pub token_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("BLOODLINK_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!(
                "BLOODLINK_JWT_SECRET is unset or still a placeholder; set it in .env and restart"
            );
        }

        let db_path: PathBuf = get("BLOODLINK_DB_PATH")
            .unwrap_or_else(|| "bloodlink.db".into())
            .into();
        let host = get("BLOODLINK_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("BLOODLINK_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("BLOODLINK_PORT must be a port number")?;
        let busy_timeout_ms: u64 = get("BLOODLINK_DB_BUSY_TIMEOUT_MS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("BLOODLINK_DB_BUSY_TIMEOUT_MS must be an integer")?
            .unwrap_or(5000);
        let token_ttl_days: i64 = get("BLOODLINK_TOKEN_TTL_DAYS")
            .map(|v| v.parse::<i64>())
            .transpose()
            .context("BLOODLINK_TOKEN_TTL_DAYS must be an integer")?
            .unwrap_or(7);
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&token_ttl_days) {
            bail!("BLOODLINK_TOKEN_TTL_DAYS must be between 1 and {MAX_TOKEN_TTL_DAYS}");
        }

        Ok(Self {
            jwt_secret,
            db_path,
            host,
            port,
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            token_ttl_days,
        })
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("BLOODLINK_JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("bloodlink.db"));
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.busy_timeout, Duration::from_millis(5000));
        assert_eq!(cfg.token_ttl_days, 7);
        assert_eq!(cfg.listen_addr().unwrap().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn placeholder_secret_is_rejected() {
        assert!(config(&[]).is_err());
        assert!(config(&[("BLOODLINK_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[
            ("BLOODLINK_JWT_SECRET", "s3cret"),
            ("BLOODLINK_PORT", "8080"),
            ("BLOODLINK_HOST", "127.0.0.1"),
            ("BLOODLINK_DB_BUSY_TIMEOUT_MS", "250"),
            ("BLOODLINK_TOKEN_TTL_DAYS", "1"),
        ])
        .unwrap();
        assert_eq!(cfg.listen_addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(cfg.busy_timeout, Duration::from_millis(250));
        assert_eq!(cfg.token_ttl_days, 1);

        assert!(config(&[("BLOODLINK_JWT_SECRET", "s3cret"), ("BLOODLINK_PORT", "http")]).is_err());
    }

    #[test]
    fn token_ttl_is_bounded() {
        let ttl = |days: &str| {
            config(&[("BLOODLINK_JWT_SECRET", "s3cret"), ("BLOODLINK_TOKEN_TTL_DAYS", days)])
        };
        assert_eq!(ttl("3650").unwrap().token_ttl_days, 3650);
        assert!(ttl("0").is_err());
        assert!(ttl("3651").is_err());
        assert!(ttl("9223372036854775807").is_err());
    }
}
