use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub store_backend: StoreBackend,
    pub database_path: Option<String>,
    pub recent_transactions_limit: usize,
    /// `None` disables the background reward sweep.
    pub sweep_interval: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

fn parse_or<T: std::str::FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
    expected: &str,
) -> Result<T, ConfigError> {
    env_map
        .get(key)
        .map(|s| s.as_str())
        .unwrap_or(default)
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(key.to_string(), expected.to_string()))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_or::<u16>(&env_map, "PORT", "8080", "must be a valid u16")?;

        let store_backend = match env_map
            .get("STORE_BACKEND")
            .map(|s| s.as_str())
            .unwrap_or("sqlite")
        {
            "sqlite" => StoreBackend::Sqlite,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORE_BACKEND".to_string(),
                    format!("must be sqlite or memory, got {}", other),
                ))
            }
        };

        let database_path = env_map.get("DATABASE_PATH").cloned();
        if store_backend == StoreBackend::Sqlite && database_path.is_none() {
            return Err(ConfigError::MissingEnv("DATABASE_PATH".to_string()));
        }

        let recent_transactions_limit = parse_or::<usize>(
            &env_map,
            "RECENT_TRANSACTIONS_LIMIT",
            "10",
            "must be a positive integer",
        )?;
        if recent_transactions_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "RECENT_TRANSACTIONS_LIMIT".to_string(),
                "must be a positive integer".to_string(),
            ));
        }

        let sweep_secs = parse_or::<u64>(
            &env_map,
            "SWEEP_INTERVAL_SECS",
            "0",
            "must be a non-negative integer",
        )?;
        let sweep_interval = (sweep_secs > 0).then(|| Duration::from_secs(sweep_secs));

        Ok(Config {
            port,
            store_backend,
            database_path,
            recent_transactions_limit,
            sweep_interval,
        })
    }
}
