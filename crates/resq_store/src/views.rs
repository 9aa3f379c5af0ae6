use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement, TransactionTrait};

use crate::store::exec_raw;
use crate::ResqStore;
use resq_core::{ResqError, ResqResult, ViewApi, ViewDefinition, validate_view_name};

/// SQLite has no materialized views, so plain views stand in for them there.
fn view_keyword(backend: DatabaseBackend) -> &'static str {
    match backend {
        DatabaseBackend::Postgres => "MATERIALIZED VIEW",
        _ => "VIEW",
    }
}

fn drop_view_sql(backend: DatabaseBackend, name: &str) -> String {
    format!("DROP {} IF EXISTS \"{name}\"", view_keyword(backend))
}

fn create_view_sql(backend: DatabaseBackend, view: &ViewDefinition) -> String {
    match backend {
        DatabaseBackend::Postgres => format!(
            "CREATE MATERIALIZED VIEW IF NOT EXISTS \"{}\" AS ({})",
            view.name, view.query
        ),
        _ => format!(
            "CREATE VIEW IF NOT EXISTS \"{}\" AS {}",
            view.name, view.query
        ),
    }
}

fn list_views_sql(backend: DatabaseBackend) -> &'static str {
    match backend {
        DatabaseBackend::Postgres => {
            "SELECT matviewname AS name FROM pg_matviews WHERE schemaname = current_schema() ORDER BY matviewname"
        }
        _ => "SELECT name FROM sqlite_master WHERE type = 'view' ORDER BY name",
    }
}

impl ResqStore {
    fn defined_view(&self, name: &str) -> ResqResult<&ViewDefinition> {
        self.views.get(name).ok_or_else(|| ResqError::ViewNotFound {
            name: name.to_string(),
        })
    }
}

#[async_trait]
impl ViewApi for ResqStore {
    /// With `recreate` unset an existing view is kept as is, even when its
    /// query has changed since it was created.
    async fn create_or_refresh_view(&self, view: &ViewDefinition, recreate: bool) -> ResqResult<()> {
        validate_view_name(&view.name)?;
        let tx = self.conn.begin().await?;
        if recreate {
            exec_raw(&tx, &drop_view_sql(self.backend, &view.name)).await?;
        }
        exec_raw(&tx, &create_view_sql(self.backend, view)).await?;
        tx.commit().await?;
        log::info!("created view '{}' (recreate={recreate})", view.name);
        Ok(())
    }

    async fn refresh_view(&self, name: &str, recreate: bool) -> ResqResult<()> {
        let view = self.defined_view(name)?;
        self.create_or_refresh_view(view, recreate).await
    }

    /// Applies views in catalog order; no dependency ordering is inferred.
    async fn refresh_all_views(&self, recreate: bool) -> ResqResult<()> {
        for view in self.views.iter() {
            self.create_or_refresh_view(view, recreate).await?;
        }
        Ok(())
    }

    async fn delete_view(&self, name: &str) -> ResqResult<()> {
        validate_view_name(name)?;
        let tx = self.conn.begin().await?;
        exec_raw(&tx, &drop_view_sql(self.backend, name)).await?;
        tx.commit().await?;
        log::info!("dropped view '{name}'");
        Ok(())
    }

    async fn delete_all_views(&self) -> ResqResult<()> {
        let definitions: Vec<_> = self.views.iter().collect();
        for view in definitions.into_iter().rev() {
            self.delete_view(&view.name).await?;
        }
        Ok(())
    }

    async fn list_views(&self) -> ResqResult<Vec<String>> {
        let rows = self
            .conn
            .query_all(Statement::from_string(
                self.backend,
                list_views_sql(self.backend),
            ))
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String>("", "name").map_err(ResqError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capacity_view() -> ViewDefinition {
        ViewDefinition::new("capacities", "SELECT * FROM scalar WHERE attribute = 'capacity';")
            .expect("view")
    }

    #[test]
    fn postgres_views_are_materialized() {
        let view = capacity_view();
        assert_eq!(
            create_view_sql(DatabaseBackend::Postgres, &view),
            "CREATE MATERIALIZED VIEW IF NOT EXISTS \"capacities\" AS (SELECT * FROM scalar WHERE attribute = 'capacity')"
        );
        assert_eq!(
            drop_view_sql(DatabaseBackend::Postgres, "capacities"),
            "DROP MATERIALIZED VIEW IF EXISTS \"capacities\""
        );
    }

    #[test]
    fn sqlite_views_are_plain() {
        let view = capacity_view();
        assert_eq!(
            create_view_sql(DatabaseBackend::Sqlite, &view),
            "CREATE VIEW IF NOT EXISTS \"capacities\" AS SELECT * FROM scalar WHERE attribute = 'capacity'"
        );
        assert_eq!(
            drop_view_sql(DatabaseBackend::Sqlite, "capacities"),
            "DROP VIEW IF EXISTS \"capacities\""
        );
    }
}
