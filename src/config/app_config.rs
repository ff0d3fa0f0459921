use crate::error::{AppError, Result};
use std::{env, path::PathBuf, str::FromStr};

const DEFAULT_MAX_FILE_SIZE: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub uploads: UploadConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::ConfigError(format!(
                "Invalid STORE_BACKEND value: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_file_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./uploads"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let backend: StoreBackend = var("STORE_BACKEND", "postgres").parse()?;
        let url = lookup("DB_URL");
        if backend == StoreBackend::Postgres && url.is_none() {
            return Err(AppError::ConfigError(
                "DB_URL must be set for the postgres backend".to_string(),
            ));
        }

        Ok(Self {
            server: ServerConfig {
                host: var("HOST", "0.0.0.0"),
                port: parse_var("PORT", &var("PORT", "3000"))?,
                max_body_size: parse_var("MAX_BODY_SIZE", &var("MAX_BODY_SIZE", "10485760"))?,
            },
            database: DatabaseConfig {
                backend,
                url,
                max_connections: parse_var(
                    "DB_MAX_CONNECTIONS",
                    &var("DB_MAX_CONNECTIONS", "20"),
                )?,
            },
            uploads: UploadConfig {
                dir: PathBuf::from(var("UPLOAD_DIR", "./uploads")),
                max_file_size: parse_var(
                    "MAX_FILE_SIZE",
                    &var("MAX_FILE_SIZE", &DEFAULT_MAX_FILE_SIZE.to_string()),
                )?,
            },
            cors: CorsConfig {
                allowed_origins: lookup("CORS_ORIGINS")
                    .map(|origins| {
                        origins
                            .split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::ConfigError(format!("Invalid {} value", key)))
}
