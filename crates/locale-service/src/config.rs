use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use actor::{BatchConfig, SystemConfig};
use broker::BrokerConfig;

use crate::{Error, Result};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(Error::Config(format!("unknown LOG_FORMAT {other:?}"))),
        }
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. In-memory storage is used when unset.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub batch: BatchConfig,
    /// Deadline for every request/reply exchange.
    pub request_timeout: Duration,
    pub mailbox_capacity: usize,
    pub broker_buffer: usize,
    pub broker_publish_timeout: Duration,
    pub shutdown_timeout: Duration,
    /// Replay the whole event log into the read models on startup.
    pub rebuild_on_start: bool,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Address of the Prometheus scrape endpoint. Disabled when unset.
    pub metrics_addr: Option<SocketAddr>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Unset variables fall back to their defaults; set but unparsable ones
    /// are an error.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            database_max_connections: parse_var(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            batch: BatchConfig {
                max_size: parse_var("BATCH_MAX_SIZE", defaults.batch.max_size)?,
                max_wait: millis_var("BATCH_MAX_WAIT_MS", defaults.batch.max_wait)?,
            },
            request_timeout: Duration::from_secs(parse_var(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            mailbox_capacity: parse_var("MAILBOX_CAPACITY", defaults.mailbox_capacity)?,
            broker_buffer: parse_var("BROKER_BUFFER", defaults.broker_buffer)?,
            broker_publish_timeout: millis_var(
                "BROKER_PUBLISH_TIMEOUT_MS",
                defaults.broker_publish_timeout,
            )?,
            shutdown_timeout: millis_var("SHUTDOWN_TIMEOUT_MS", defaults.shutdown_timeout)?,
            rebuild_on_start: parse_var("REBUILD_ON_START", defaults.rebuild_on_start)?,
            log_level: env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parse_var("LOG_FORMAT", defaults.log_format)?,
            metrics_addr: env::var("METRICS_ADDR")
                .ok()
                .filter(|addr| !addr.is_empty())
                .map(|addr| {
                    addr.parse()
                        .map_err(|e| Error::Config(format!("METRICS_ADDR {addr:?}: {e}")))
                })
                .transpose()?,
        })
    }

    /// Actor system settings derived from this configuration.
    pub fn system_config(&self) -> SystemConfig {
        SystemConfig {
            mailbox_capacity: self.mailbox_capacity,
            shutdown_timeout: self.shutdown_timeout,
            broker: BrokerConfig {
                buffer: self.broker_buffer,
                publish_timeout: self.broker_publish_timeout,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let system = SystemConfig::default();
        Self {
            database_url: None,
            database_max_connections: 5,
            batch: BatchConfig::default(),
            request_timeout: Duration::from_secs(60),
            mailbox_capacity: system.mailbox_capacity,
            broker_buffer: system.broker.buffer,
            broker_publish_timeout: system.broker.publish_timeout,
            shutdown_timeout: system.shutdown_timeout,
            rebuild_on_start: false,
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_addr: None,
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) if !value.is_empty() => value
            .parse()
            .map_err(|e| Error::Config(format!("{key} {value:?}: {e}"))),
        _ => Ok(default),
    }
}

fn millis_var(key: &str, default: Duration) -> Result<Duration> {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    parse_var(key, default_ms).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database_url.is_none());
        assert_eq!(config.batch.max_size, 5);
        assert_eq!(config.batch.max_wait, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.rebuild_on_start);
    }

    #[test]
    fn test_system_config_carries_broker_settings() {
        let config = Config {
            mailbox_capacity: 8,
            broker_buffer: 2,
            broker_publish_timeout: Duration::from_millis(10),
            ..Config::default()
        };

        let system = config.system_config();
        assert_eq!(system.mailbox_capacity, 8);
        assert_eq!(system.broker.buffer, 2);
        assert_eq!(system.broker.publish_timeout, Duration::from_millis(10));
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_parse_var_falls_back_when_unset() {
        let value: usize = parse_var("LOCALE_SERVICE_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
