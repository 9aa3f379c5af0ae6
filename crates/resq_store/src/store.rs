use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::sea_query::{
    self, PostgresQueryBuilder, QueryStatementWriter, SqliteQueryBuilder,
};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, QueryResult,
    Statement,
};
use sea_orm_migration::MigratorTrait;

use crate::migration::Migrator;
use crate::{DatabaseConfig, ResqConfig};
use resq_core::{Mappings, ResqError, ResqResult, ViewCatalog};

/// Result store over a SeaORM connection pool. Cheap to clone; the mappings
/// and view catalog are shared read-only.
#[derive(Clone)]
pub struct ResqStore {
    pub(crate) conn: DatabaseConnection,
    pub(crate) backend: DatabaseBackend,
    pub(crate) mappings: Arc<Mappings>,
    pub(crate) views: Arc<ViewCatalog>,
    failpoints: HashSet<String>,
}

#[derive(Clone, Copy, Debug)]
pub struct BackendCapabilities {
    pub transactional_ddl: bool,
    pub partial_indexes: bool,
    pub materialized_views: bool,
}

impl ResqStore {
    /// Connects and brings the schema up to date. Mappings and views start
    /// empty; attach them with [`ResqStore::with_mappings`] and
    /// [`ResqStore::with_views`].
    pub async fn connect(config: &ResqConfig, base_dir: &Path) -> ResqResult<Self> {
        let url = build_connection_url(config, base_dir)?;
        let mut options = ConnectOptions::new(url);
        options.sqlx_logging(false);
        if let Some(pool) = &config.pool {
            if let Some(max) = pool.max_connections {
                options.max_connections(max);
            }
            if let Some(min) = pool.min_connections {
                options.min_connections(min);
            }
            if let Some(timeout_ms) = pool.connect_timeout_ms {
                options.connect_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.acquire_timeout_ms {
                options.acquire_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.idle_timeout_ms {
                options.idle_timeout(Duration::from_millis(timeout_ms));
            }
        }
        let conn = Database::connect(options).await.map_err(ResqError::from)?;
        let backend = conn.get_database_backend();
        let failpoints = config
            .failpoints
            .clone()
            .unwrap_or_default()
            .into_iter()
            .collect::<HashSet<_>>();
        let store = Self {
            conn,
            backend,
            mappings: Arc::new(Mappings::default()),
            views: Arc::new(ViewCatalog::default()),
            failpoints,
        };
        if !store.capabilities().partial_indexes {
            return Err(ResqError::validation(format!(
                "backend {backend:?} has no partial unique indexes"
            )));
        }
        Migrator::up(&store.conn, None)
            .await
            .map_err(ResqError::from)?;
        log::info!("resq store connected ({})", config.backend_name());
        Ok(store)
    }

    pub async fn connect_sqlite(path: &Path) -> ResqResult<Self> {
        let config = ResqConfig::default_sqlite(path.to_string_lossy());
        Self::connect(&config, path.parent().unwrap_or_else(|| Path::new("."))).await
    }

    pub fn with_mappings(mut self, mappings: Mappings) -> Self {
        self.mappings = Arc::new(mappings);
        self
    }

    pub fn with_views(mut self, views: ViewCatalog) -> Self {
        self.views = Arc::new(views);
        self
    }

    pub fn mappings(&self) -> &Mappings {
        &self.mappings
    }

    pub fn views(&self) -> &ViewCatalog {
        &self.views
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub fn capabilities(&self) -> BackendCapabilities {
        match self.backend {
            DatabaseBackend::Sqlite => BackendCapabilities {
                transactional_ddl: true,
                partial_indexes: true,
                materialized_views: false,
            },
            DatabaseBackend::Postgres => BackendCapabilities {
                transactional_ddl: true,
                partial_indexes: true,
                materialized_views: true,
            },
            _ => BackendCapabilities {
                transactional_ddl: false,
                partial_indexes: false,
                materialized_views: false,
            },
        }
    }

    pub(crate) fn maybe_failpoint(&self, key: &str) -> ResqResult<()> {
        if self.failpoints.contains(key) {
            Err(ResqError::storage(format!("failpoint {key}")))
        } else {
            Ok(())
        }
    }
}

pub(crate) fn col_name(column: impl sea_query::Iden) -> String {
    column.to_string()
}

fn build_stmt<S: QueryStatementWriter>(
    backend: DatabaseBackend,
    stmt: &S,
) -> (String, sea_query::Values) {
    match backend {
        DatabaseBackend::Postgres => stmt.build(PostgresQueryBuilder),
        _ => stmt.build(SqliteQueryBuilder),
    }
}

pub(crate) async fn exec<C, S>(conn: &C, stmt: &S) -> ResqResult<u64>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let result = conn
        .execute(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn exec_raw<C: ConnectionTrait>(conn: &C, sql: &str) -> ResqResult<()> {
    conn.execute_unprepared(sql).await?;
    Ok(())
}

pub(crate) async fn query_all<C, S>(conn: &C, stmt: &S) -> ResqResult<Vec<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let rows = conn
        .query_all(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(rows)
}

pub(crate) async fn query_one<C, S>(conn: &C, stmt: &S) -> ResqResult<Option<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let row = conn
        .query_one(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(row)
}

pub(crate) fn read_i64(row: &QueryResult, column: impl sea_query::Iden) -> ResqResult<i64> {
    Ok(row.try_get("", &col_name(column))?)
}

pub(crate) fn read_opt_i64(
    row: &QueryResult,
    column: impl sea_query::Iden,
) -> ResqResult<Option<i64>> {
    Ok(row.try_get("", &col_name(column))?)
}

fn build_connection_url(config: &ResqConfig, base_dir: &Path) -> ResqResult<String> {
    match &config.database {
        DatabaseConfig::Sqlite { .. } => {
            let path = config.sqlite_path(base_dir)?;
            Ok(format!("sqlite://{}?mode=rwc", path.display()))
        }
        DatabaseConfig::Postgres { url } => Ok(url.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn failpoints_are_read_from_config() -> ResqResult<()> {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        let mut config = ResqConfig::default_sqlite(base.join("fp.sqlite").to_string_lossy());
        config.failpoints = Some(vec!["after_scalars".to_string()]);
        let store = ResqStore::connect(&config, base).await?;
        assert!(store.maybe_failpoint("after_scalars").is_err());
        assert!(store.maybe_failpoint("after_sequences").is_ok());
        Ok(())
    }

    #[test]
    fn sqlite_url_is_resolved_against_base_dir() {
        let config = ResqConfig::default_sqlite("data/resq.sqlite");
        let url = build_connection_url(&config, Path::new("/srv/resq")).expect("url");
        assert_eq!(url, "sqlite:///srv/resq/data/resq.sqlite?mode=rwc");
    }
}
