use std::fmt;

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Weather,
    Climate,
    Period,
    Sensitivity,
}

impl ReferenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceKind::Weather => "weather",
            ReferenceKind::Climate => "climate",
            ReferenceKind::Period => "period",
            ReferenceKind::Sensitivity => "sensitivity",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ResqError {
    #[error("{kind} '{name}' not found")]
    ReferenceNotFound { kind: ReferenceKind, name: String },
    #[error("scenario #{id} not found")]
    ScenarioNotFound { id: i64 },
    #[error("cluster '{cluster}' for component '{component}' not found")]
    ClusterNotFound { component: String, cluster: String },
    #[error("component '{component}' is mapped to both cluster '{first}' and cluster '{second}'")]
    ClusterConflict {
        component: String,
        first: String,
        second: String,
    },
    #[error("view '{name}' is not defined")]
    ViewNotFound { name: String },
    #[error("uniqueness conflict: {message}")]
    UniquenessConflict { message: String },
    #[error("storage unavailable: {message}")]
    StorageUnavailable { message: String },
    #[error("storage error: {message}")]
    Storage { message: String },
    #[error("validation error: {message}")]
    Validation { message: String },
}

impl ResqError {
    pub fn reference_not_found(kind: ReferenceKind, name: impl Into<String>) -> Self {
        Self::ReferenceNotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn scenario_not_found(id: impl Into<i64>) -> Self {
        Self::ScenarioNotFound { id: id.into() }
    }

    pub fn cluster_not_found(component: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self::ClusterNotFound {
            component: component.into(),
            cluster: cluster.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::UniquenessConflict {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn is_uniqueness_conflict(&self) -> bool {
        matches!(self, Self::UniquenessConflict { .. })
    }
}

pub type ResqResult<T> = Result<T, ResqError>;

impl From<DbErr> for ResqError {
    fn from(value: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(message)) = value.sql_err() {
            return ResqError::conflict(message);
        }
        match value {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => ResqError::unavailable(value.to_string()),
            other => ResqError::storage(other.to_string()),
        }
    }
}
