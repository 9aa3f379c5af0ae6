use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use resq_core::{ResqError, ResqResult};

const DEFAULT_CONFIG_NAME: &str = "resq.json";
const DEFAULT_MAPPINGS_DIR: &str = "config";
const DEFAULT_VIEWS_DIR: &str = "views";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DatabaseConfig {
    Sqlite { path: Option<String> },
    Postgres { url: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    pub acquire_timeout_ms: Option<u64>,
    pub idle_timeout_ms: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResqConfig {
    pub database: DatabaseConfig,
    pub pool: Option<PoolConfig>,
    pub mappings_dir: Option<String>,
    pub views_dir: Option<String>,
    pub failpoints: Option<Vec<String>>,
}

impl ResqConfig {
    pub fn default_sqlite(path: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig::Sqlite {
                path: Some(path.into()),
            },
            pool: None,
            mappings_dir: None,
            views_dir: None,
            failpoints: None,
        }
    }

    pub fn load_or_init(base_dir: &Path, default_sqlite_path: &Path) -> ResqResult<Self> {
        fs::create_dir_all(base_dir)
            .map_err(|err| ResqError::storage(format!("create config dir: {err}")))?;
        let config_path = base_dir.join(DEFAULT_CONFIG_NAME);
        if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .map_err(|err| ResqError::storage(format!("read config: {err}")))?;
            let config: ResqConfig = serde_json::from_str(&raw)
                .map_err(|err| ResqError::validation(err.to_string()))?;
            return Ok(config);
        }
        let default = ResqConfig::default_sqlite(default_sqlite_path.to_string_lossy());
        let payload = serde_json::to_string_pretty(&default)
            .map_err(|err| ResqError::storage(format!("serialize config: {err}")))?;
        fs::write(&config_path, payload)
            .map_err(|err| ResqError::storage(format!("write config: {err}")))?;
        Ok(default)
    }

    pub fn sqlite_path(&self, base_dir: &Path) -> ResqResult<PathBuf> {
        match &self.database {
            DatabaseConfig::Sqlite { path } => {
                let path = path.clone().unwrap_or_else(|| "resq.sqlite".to_string());
                Ok(resolve(base_dir, &path))
            }
            _ => Err(ResqError::validation("config is not sqlite backend")),
        }
    }

    pub fn mappings_dir(&self, base_dir: &Path) -> PathBuf {
        resolve(
            base_dir,
            self.mappings_dir.as_deref().unwrap_or(DEFAULT_MAPPINGS_DIR),
        )
    }

    pub fn views_dir(&self, base_dir: &Path) -> PathBuf {
        resolve(base_dir, self.views_dir.as_deref().unwrap_or(DEFAULT_VIEWS_DIR))
    }

    pub fn backend_name(&self) -> &'static str {
        match self.database {
            DatabaseConfig::Sqlite { .. } => "sqlite",
            DatabaseConfig::Postgres { .. } => "postgres",
        }
    }

    pub fn connection_url(&self) -> Option<&str> {
        match &self.database {
            DatabaseConfig::Sqlite { .. } => None,
            DatabaseConfig::Postgres { url } => Some(url.as_str()),
        }
    }
}

fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let candidate = PathBuf::from(path);
    if candidate.is_absolute() {
        candidate
    } else {
        base_dir.join(candidate)
    }
}
