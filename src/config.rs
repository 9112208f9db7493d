use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    pub dataset_cache_capacity: u64,
    pub dataset_idle_secs: u64,
    pub memo_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_file_size: default_max_file_size(),
            dataset_cache_capacity: 64,
            dataset_idle_secs: 3600,
            memo_capacity: 32,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        let defaults = Config::default();
        Ok(Config {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_setting("PORT", defaults.port)?,
            max_file_size: env_setting("MAX_FILE_SIZE", defaults.max_file_size)?,
            dataset_cache_capacity: env_setting(
                "DATASET_CACHE_CAPACITY",
                defaults.dataset_cache_capacity,
            )?,
            dataset_idle_secs: env_setting("DATASET_IDLE_SECS", defaults.dataset_idle_secs)?,
            memo_capacity: env_setting("MEMO_CAPACITY", defaults.memo_capacity)?,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow!("Invalid listen address {}:{}: {}", self.host, self.port, e))
    }
}

pub fn load_config() -> Result<Config> {
    Config::from_env()
}

fn env_setting<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    parse_setting(key, std::env::var(key).ok(), default)
}

fn parse_setting<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow!("Failed to load {}: {}", key, e)),
        None => Ok(default),
    }
}
