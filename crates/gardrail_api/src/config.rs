//! Environment-based server configuration.
//!
//! # Responsibility
//! - Read runtime settings from `GARDRAIL_*` environment variables with
//!   sensible defaults.
//!
//! # Invariants
//! - Core never reads the environment; all env access lives here.

const DEFAULT_DB_PATH: &str = "gardrail.sqlite3";
const DEFAULT_PORT: u16 = 8000;

/// Runtime settings for the API server.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file path (`GARDRAIL_DB_PATH`).
    pub db_path: String,
    /// TCP port to bind (`GARDRAIL_PORT`).
    pub port: u16,
    /// Log level for core logging (`GARDRAIL_LOG_LEVEL`).
    pub log_level: String,
    /// Absolute log directory; file logging is skipped when unset
    /// (`GARDRAIL_LOG_DIR`).
    pub log_dir: Option<String>,
}

impl Config {
    /// Builds a config from the process environment.
    pub fn from_env() -> Result<Self, String> {
        let db_path =
            std::env::var("GARDRAIL_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

        let port = match std::env::var("GARDRAIL_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| format!("invalid GARDRAIL_PORT `{value}`"))?,
            Err(_) => DEFAULT_PORT,
        };

        let log_level = std::env::var("GARDRAIL_LOG_LEVEL")
            .unwrap_or_else(|_| gardrail_core::default_log_level().to_string());
        let log_dir = std::env::var("GARDRAIL_LOG_DIR").ok();

        Ok(Self {
            db_path,
            port,
            log_level,
            log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn defaults_apply_without_environment() {
        let config = Config::from_env().unwrap();
        assert!(!config.db_path.is_empty());
        assert!(config.port > 0);
    }
}
