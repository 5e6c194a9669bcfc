use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_STORAGE_BASE_URL: &str = "https://storage.poehali.dev/mellstroy";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Runtime settings read from the process environment.
///
/// | Env Var                         | Default                                 |
/// |---------------------------------|-----------------------------------------|
/// | `DATABASE_URL`                  | required                                |
/// | `HOST`                          | `0.0.0.0`                               |
/// | `PORT`                          | `3001`                                  |
/// | `DATABASE_MAX_CONNECTIONS`      | `5`                                     |
/// | `DATABASE_ACQUIRE_TIMEOUT_SECS` | `10`                                    |
/// | `STORAGE_BASE_URL`              | `https://storage.poehali.dev/mellstroy` |
/// | `MAX_UPLOAD_BYTES`              | `536870912` (512 MiB)                   |
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Host prefix used to build upload URLs, without a trailing slash.
    pub storage_base_url: String,
    /// Largest request body `/upload` will buffer.
    pub max_upload_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("PORT", 3001u16)?;
        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS", 5u32)?;
        let acquire_timeout = Duration::from_secs(parse_var("DATABASE_ACQUIRE_TIMEOUT_SECS", 10u64)?);

        let storage_base_url = std::env::var("STORAGE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_STORAGE_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        Ok(Self {
            database_url,
            host,
            port,
            max_connections,
            acquire_timeout,
            storage_base_url,
            max_upload_bytes,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} must be a valid number, got {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

/// Settings for router tests; nothing here is read from the environment.
#[cfg(test)]
pub(crate) fn test_settings() -> Settings {
    Settings {
        database_url: String::new(),
        host: "127.0.0.1".to_string(),
        port: 0,
        max_connections: 1,
        acquire_timeout: Duration::from_secs(1),
        storage_base_url: DEFAULT_STORAGE_BASE_URL.to_string(),
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_falls_back_to_default_when_unset() {
        let value = parse_var("WIN_VIDEOS_TEST_SURELY_UNSET", 42u16).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn parse_var_rejects_garbage() {
        std::env::set_var("WIN_VIDEOS_TEST_BAD_PORT", "eighty");
        let err = parse_var("WIN_VIDEOS_TEST_BAD_PORT", 80u16).unwrap_err();
        assert!(err.to_string().contains("WIN_VIDEOS_TEST_BAD_PORT"));
        std::env::remove_var("WIN_VIDEOS_TEST_BAD_PORT");
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        let settings = Settings {
            port: 8080,
            ..test_settings()
        };
        assert_eq!(settings.bind_address(), "127.0.0.1:8080");
    }
}
