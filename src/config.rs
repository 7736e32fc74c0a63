use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_PATH: &str = "csv_analysis.db";

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// SQLite file path, or `:memory:` for a throwaway database.
    pub database_path: String,
    pub max_file_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        Ok(Config {
            host: env_or("HOST", DEFAULT_HOST.parse()?)?,
            port: env_or("PORT", DEFAULT_PORT)?,
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string()),
            max_file_size: env_or("MAX_FILE_SIZE", default_max_file_size())?,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn in_memory_database(&self) -> bool {
        self.database_path == ":memory:"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_PORT,
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Failed to parse {key}={raw:?}")),
        Err(_) => Ok(default),
    }
}

pub fn load_config() -> Result<Config> {
    Config::from_env()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_to_default_when_unset() {
        let port: u16 = env_or("CSV_ANALYSIS_TEST_UNSET_PORT", 8080).unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn env_or_rejects_unparseable_values() {
        std::env::set_var("CSV_ANALYSIS_TEST_BAD_SIZE", "lots");
        let size: Result<usize> = env_or("CSV_ANALYSIS_TEST_BAD_SIZE", 1);
        assert!(size.is_err());
    }

    #[test]
    fn default_config_binds_localhost() {
        let config = Config::default();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(!config.in_memory_database());
    }
}
