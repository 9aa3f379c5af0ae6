use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, DatabaseBackend};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Unique key whose last column is nullable. Rendered as two filtered unique
/// indexes so a NULL in that column still participates in uniqueness.
struct PartialUnique {
    table: &'static str,
    prefix: &'static str,
    columns: &'static [&'static str],
    nullable: &'static str,
}

const PARTIAL_UNIQUE_KEYS: &[PartialUnique] = &[
    PartialUnique {
        table: "scenario",
        prefix: "scenario",
        columns: &["period_id", "weather_id", "climate_id"],
        nullable: "sensitivity_id",
    },
    PartialUnique {
        table: "scalar",
        prefix: "scalar_unique",
        columns: &["scenario_id", "from_node", "attribute"],
        nullable: "to_node",
    },
    PartialUnique {
        table: "sequence",
        prefix: "sequence_unique",
        columns: &["scenario_id", "from_node", "attribute"],
        nullable: "to_node",
    },
    PartialUnique {
        table: "category",
        prefix: "category_unique",
        columns: &["from_node"],
        nullable: "to_node",
    },
];

impl PartialUnique {
    fn without_name(&self) -> String {
        format!("{}_without_{}", self.prefix, self.nullable)
    }

    fn with_name(&self) -> String {
        format!("{}_with_{}", self.prefix, self.nullable)
    }

    fn create_statements(&self) -> [String; 2] {
        let base = quoted_list(self.columns);
        [
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS \"{}\" ON \"{}\" ({base}) WHERE \"{}\" IS NULL",
                self.without_name(),
                self.table,
                self.nullable,
            ),
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS \"{}\" ON \"{}\" ({base}, \"{}\") WHERE \"{}\" IS NOT NULL",
                self.with_name(),
                self.table,
                self.nullable,
                self.nullable,
            ),
        ]
    }

    fn drop_statements(&self) -> [String; 2] {
        [
            format!("DROP INDEX IF EXISTS \"{}\"", self.without_name()),
            format!("DROP INDEX IF EXISTS \"{}\"", self.with_name()),
        ]
    }
}

fn quoted_list(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|column| format!("\"{column}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if !supports_partial_indexes(manager.get_database_backend()) {
            return Err(DbErr::Migration(
                "backend has no partial unique indexes".to_string(),
            ));
        }
        let conn = manager.get_connection();
        for key in PARTIAL_UNIQUE_KEYS {
            for sql in key.create_statements() {
                conn.execute_unprepared(&sql).await?;
            }
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        for key in PARTIAL_UNIQUE_KEYS {
            for sql in key.drop_statements() {
                conn.execute_unprepared(&sql).await?;
            }
        }
        Ok(())
    }
}

fn supports_partial_indexes(backend: DatabaseBackend) -> bool {
    matches!(backend, DatabaseBackend::Sqlite | DatabaseBackend::Postgres)
}

#[cfg(test)]
mod tests {
    use super::PARTIAL_UNIQUE_KEYS;

    #[test]
    fn scenario_key_renders_both_filters() {
        let [without, with] = PARTIAL_UNIQUE_KEYS[0].create_statements();
        assert_eq!(
            without,
            "CREATE UNIQUE INDEX IF NOT EXISTS \"scenario_without_sensitivity_id\" ON \"scenario\" (\"period_id\", \"weather_id\", \"climate_id\") WHERE \"sensitivity_id\" IS NULL"
        );
        assert!(with.ends_with("(\"period_id\", \"weather_id\", \"climate_id\", \"sensitivity_id\") WHERE \"sensitivity_id\" IS NOT NULL"));
    }
}
