use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub mod domain;
pub mod infrastructure;
pub mod service;

#[derive(Clone, Debug, Deserialize)]
pub struct ReservationConfig {
    /// 開発モード
    pub debug: bool,
    /// テスト用の分離された設定
    pub testing: bool,
    pub server: Server,
    pub database: Database,
    pub logger: Logger,
}

impl ReservationConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("reservation").required(false))
            .add_source(
                Environment::with_prefix("RESERVATION")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<ReservationConfig>()
    }

    pub fn testing() -> Result<Self, ConfigError> {
        Self::builder()?
            .set_override("testing", true)?
            .set_override("debug", true)?
            .build()?
            .try_deserialize::<ReservationConfig>()
    }

    pub fn database_url(&self) -> &str {
        if self.testing {
            &self.database.test_url
        } else {
            &self.database.url
        }
    }

    pub fn log_level(&self) -> Level {
        match (&self.logger.level, self.debug) {
            (Level::INFO | Level::WARN | Level::ERROR, true) => Level::DEBUG,
            (level, _) => level.clone(),
        }
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("debug", true)?
            .set_default("testing", false)?
            .set_default("server.addr", "127.0.0.1:5000")?
            .set_default("database.url", "sqlite://reservation.sqlite")?
            .set_default("database.test_url", "sqlite::memory:")?
            .set_default("database.max_connections", 5)?
            .set_default("logger.level", "INFO")
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    pub addr: String,
    pub tls: Option<Tls>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Tls {
    pub cert: String,
    pub key: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Database {
    pub url: String,
    pub test_url: String,
    pub max_connections: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Logger {
    pub level: Level,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub enum Level {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl From<&Level> for tracing::Level {
    fn from(value: &Level) -> Self {
        match value {
            Level::TRACE => tracing::Level::TRACE,
            Level::DEBUG => tracing::Level::DEBUG,
            Level::INFO => tracing::Level::INFO,
            Level::WARN => tracing::Level::WARN,
            Level::ERROR => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testing_profile_uses_isolated_store() {
        let config = ReservationConfig::testing().unwrap();
        assert!(config.testing);
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.log_level(), Level::DEBUG);
    }

    #[test]
    fn trace_level_is_kept_in_debug_mode() {
        let mut config = ReservationConfig::testing().unwrap();
        config.logger.level = Level::TRACE;
        assert_eq!(config.log_level(), Level::TRACE);
        config.debug = false;
        config.logger.level = Level::WARN;
        assert_eq!(config.log_level(), Level::WARN);
    }

    #[test]
    fn default_url_is_used_outside_tests() {
        let mut config = ReservationConfig::testing().unwrap();
        config.testing = false;
        assert_eq!(config.database_url(), "sqlite://reservation.sqlite");
    }
}
