use std::env;

use crate::calendar::UndatedPolicy;
use crate::error::BoardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

#[derive(Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub mongo_uri: Option<String>,
    pub database_name: String,
    pub jwt_secret: String,
    pub frontend_origin: String,
    pub bind_addr: String,
    pub undated_policy: UndatedPolicy,
    pub notification_limit: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, BoardError> {
        dotenv::dotenv().ok();

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "mongo".to_string())
            .to_lowercase()
            .as_str()
        {
            "mongo" | "mongodb" => StorageBackend::Mongo,
            "memory" | "local" => StorageBackend::Memory,
            other => return Err(BoardError::Config(format!("unknown STORAGE_BACKEND {other}"))),
        };

        let mongo_uri = env::var("MONGO_URI").ok();
        if storage_backend == StorageBackend::Mongo && mongo_uri.is_none() {
            return Err(BoardError::Config("MONGO_URI must be set".into()));
        }

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| BoardError::Config("JWT_SECRET must be set".into()))?;

        let undated_policy = match env::var("CALENDAR_UNDATED_POLICY") {
            Ok(raw) => UndatedPolicy::parse(&raw)
                .ok_or_else(|| BoardError::Config(format!("unknown CALENDAR_UNDATED_POLICY {raw}")))?,
            Err(_) => UndatedPolicy::default(),
        };

        let notification_limit = env::var("NOTIFICATION_LIMIT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .filter(|limit: &i64| *limit > 0)
            .unwrap_or(20);

        Ok(Self {
            storage_backend,
            mongo_uri,
            database_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "contentflow".to_string()),
            jwt_secret,
            frontend_origin: env::var("FRONTEND_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            undated_policy,
            notification_limit,
        })
    }

    /// In-memory configuration for tests and local runs.
    pub fn local(jwt_secret: &str) -> Self {
        Self {
            storage_backend: StorageBackend::Memory,
            mongo_uri: None,
            database_name: "contentflow".to_string(),
            jwt_secret: jwt_secret.to_string(),
            frontend_origin: "http://localhost:3000".to_string(),
            bind_addr: "127.0.0.1:8080".to_string(),
            undated_policy: UndatedPolicy::default(),
            notification_limit: 20,
        }
    }
}
