use crate::store::DatabaseConfig;
use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr, time::Duration};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
    pub log_json: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Fruit and bucket inventory API")]
pub struct Args {
    /// Host to bind to (overrides FRUIT_STORE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides FRUIT_STORE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides FRUIT_STORE_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Pool size (overrides FRUIT_STORE_MAX_CONNECTIONS)
    #[arg(long)]
    pub max_connections: Option<u32>,

    /// How long a write waits on a locked database, in milliseconds
    /// (overrides FRUIT_STORE_BUSY_TIMEOUT_MS)
    #[arg(long)]
    pub busy_timeout_ms: Option<u64>,

    /// Emit logs as JSON lines (or set FRUIT_STORE_LOG_JSON to true/false, 1/0, yes/no, on/off)
    #[arg(long)]
    pub log_json: bool,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::merge(args, |key| env::var(key).ok())?;
        Ok((cfg, migrate))
    }

    /// CLI values win; `lookup` supplies environment fallbacks.
    pub fn merge(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // --- Environment fallback ---
        let env_host = lookup("FRUIT_STORE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let env_port = parse_var(&lookup, "FRUIT_STORE_PORT", 3000)?;
        let env_db = lookup("FRUIT_STORE_DATABASE_URL")
            .unwrap_or_else(|| "sqlite://./data/fruit_store.db".into());
        let env_max_connections = parse_var(&lookup, "FRUIT_STORE_MAX_CONNECTIONS", 5)?;
        let env_busy_timeout = parse_var(&lookup, "FRUIT_STORE_BUSY_TIMEOUT_MS", 5000)?;
        let env_log_json = parse_flag(&lookup, "FRUIT_STORE_LOG_JSON")?;

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            max_connections: args.max_connections.unwrap_or(env_max_connections),
            busy_timeout_ms: args.busy_timeout_ms.unwrap_or(env_busy_timeout),
            log_json: args.log_json || env_log_json,
        };

        if cfg.max_connections == 0 {
            anyhow::bail!("max connections must be at least 1");
        }

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database_url.clone(),
            max_connections: self.max_connections,
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        None => Ok(default),
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<bool> {
    let Some(value) = lookup(key) else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => anyhow::bail!("parsing {} value `{}`: expected true/false or 1/0", key, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_env_or_args() {
        let cfg = AppConfig::merge(Args::default(), env_of(&[])).unwrap();

        assert_eq!(cfg.addr(), "0.0.0.0:3000");
        assert_eq!(cfg.database_url, "sqlite://./data/fruit_store.db");
        assert_eq!(cfg.max_connections, 5);
        assert_eq!(cfg.database().busy_timeout, Duration::from_millis(5000));
        assert!(!cfg.log_json);
    }

    #[test]
    fn args_override_env() {
        let args = Args {
            port: Some(8080),
            ..Args::default()
        };
        let cfg = AppConfig::merge(
            args,
            env_of(&[
                ("FRUIT_STORE_PORT", "9000"),
                ("FRUIT_STORE_HOST", "127.0.0.1"),
                ("FRUIT_STORE_LOG_JSON", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.addr(), "127.0.0.1:8080");
        assert!(cfg.log_json);
    }

    #[test]
    fn malformed_env_is_an_error() {
        let err = AppConfig::merge(Args::default(), env_of(&[("FRUIT_STORE_PORT", "eighty")]))
            .unwrap_err();

        assert!(err.to_string().contains("FRUIT_STORE_PORT"));
    }

    #[test]
    fn log_json_accepts_numeric_and_word_flags() {
        for (raw, expected) in [("1", true), ("on", true), ("TRUE", true), ("0", false), ("no", false)] {
            let cfg = AppConfig::merge(Args::default(), env_of(&[("FRUIT_STORE_LOG_JSON", raw)]))
                .unwrap();
            assert_eq!(cfg.log_json, expected, "FRUIT_STORE_LOG_JSON={raw}");
        }

        let err = AppConfig::merge(Args::default(), env_of(&[("FRUIT_STORE_LOG_JSON", "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("FRUIT_STORE_LOG_JSON"));
    }

    #[test]
    fn zero_connections_is_rejected() {
        let args = Args {
            max_connections: Some(0),
            ..Args::default()
        };

        assert!(AppConfig::merge(args, env_of(&[])).is_err());
    }
}
