use config::{Config as ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{ReportdError, ReportdResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub lock: LockConfig,
    pub upstream: UpstreamConfig,
    pub scheduler: SchedulerConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// "redis" for fleet deployments, "memory" for single-process ones.
    pub backend: String,
    pub redis_url: String,
    pub key_prefix: String,
    pub default_ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub poll_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/reportd".to_string(),
                max_connections: 10,
                connection_timeout_seconds: 30,
            },
            lock: LockConfig {
                backend: "redis".to_string(),
                redis_url: "redis://localhost:6379".to_string(),
                key_prefix: "reportd".to_string(),
                default_ttl_seconds: 300,
            },
            upstream: UpstreamConfig {
                base_url: "http://localhost:9090".to_string(),
                timeout_seconds: 30,
            },
            scheduler: SchedulerConfig {
                enabled: true,
                poll_interval_seconds: 10,
            },
            log: LogConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> ReportdResult<Self> {
        let config = Self::build(config_path)
            .map_err(|e| ReportdError::config_error(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn build(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder()
            .set_default("database.url", "postgresql://localhost/reportd")?
            .set_default("database.max_connections", 10)?
            .set_default("database.connection_timeout_seconds", 30)?
            .set_default("lock.backend", "redis")?
            .set_default("lock.redis_url", "redis://localhost:6379")?
            .set_default("lock.key_prefix", "reportd")?
            .set_default("lock.default_ttl_seconds", 300)?
            .set_default("upstream.base_url", "http://localhost:9090")?
            .set_default("upstream.timeout_seconds", 30)?
            .set_default("scheduler.enabled", true)?
            .set_default("scheduler.poll_interval_seconds", 10)?
            .set_default("log.level", "info")?
            .set_default("log.format", "pretty")?;

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(ConfigError::Message(format!(
                    "config file does not exist: {path}"
                )));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else {
            for path in ["config/reportd.toml", "reportd.toml", "/etc/reportd/config.toml"] {
                if Path::new(path).exists() {
                    builder = builder.add_source(File::new(path, FileFormat::Toml));
                    break;
                }
            }
        }

        builder = builder.add_source(Environment::with_prefix("REPORTD").separator("__"));

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> ReportdResult<()> {
        if self.database.url.is_empty() {
            return Err(ReportdError::config_error("database.url must not be empty"));
        }
        match self.lock.backend.as_str() {
            "redis" => {
                if self.lock.redis_url.is_empty() {
                    return Err(ReportdError::config_error(
                        "lock.redis_url must not be empty for the redis backend",
                    ));
                }
            }
            "memory" => {}
            other => {
                return Err(ReportdError::config_error(format!(
                    "unsupported lock backend: {other}"
                )))
            }
        }
        if self.lock.default_ttl_seconds == 0 {
            return Err(ReportdError::config_error(
                "lock.default_ttl_seconds must be at least 1",
            ));
        }
        if self.scheduler.poll_interval_seconds == 0 {
            return Err(ReportdError::config_error(
                "scheduler.poll_interval_seconds must be at least 1",
            ));
        }
        Ok(())
    }
}
