use std::path::{Path, PathBuf};

use crate::{ResqConfig, ResqStore};
use resq_core::{Mappings, ResqResult, ViewCatalog};

const DEFAULT_DB_NAME: &str = "resq.sqlite";

pub fn load_or_init_config(base: &Path) -> ResqResult<ResqConfig> {
    ResqConfig::load_or_init(base, &default_sqlite_path(base))
}

/// Connects using `resq.json` under `base` and attaches the mappings and view
/// definitions found in the configured directories.
pub async fn open_store(base: &Path) -> ResqResult<ResqStore> {
    let config = load_or_init_config(base)?;
    let mappings = Mappings::load(&config.mappings_dir(base))?;
    let views = ViewCatalog::load_dir(&config.views_dir(base))?;
    log::info!(
        "loaded {} cluster assignments and {} view definitions",
        mappings.clusters.len(),
        views.len()
    );
    Ok(ResqStore::connect(&config, base)
        .await?
        .with_mappings(mappings)
        .with_views(views))
}

pub fn default_sqlite_path(base: &Path) -> PathBuf {
    base.join(DEFAULT_DB_NAME)
}

#[cfg(test)]
mod tests {
    use super::{default_sqlite_path, load_or_init_config, open_store};
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn opens_store_with_default_config() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        let config = load_or_init_config(base).expect("config");
        assert_eq!(config.backend_name(), "sqlite");
        assert!(base.join("resq.json").exists());
        let store = open_store(base).await.expect("open store");
        assert!(default_sqlite_path(base).exists());
        assert!(store.mappings().clusters.is_empty());
        assert!(store.views().is_empty());
    }

    #[tokio::test]
    async fn attaches_mappings_and_views_from_base_dir() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        fs::create_dir_all(base.join("config")).expect("config dir");
        fs::create_dir_all(base.join("views")).expect("views dir");
        fs::write(
            base.join("config").join("clusters.json"),
            r#"{"Nordfeld": ["wind_onshore", "pv_ground"]}"#,
        )
        .expect("clusters");
        fs::write(
            base.join("views").join("capacities.sql"),
            "SELECT from_node, value FROM scalar WHERE attribute = 'capacity';",
        )
        .expect("view");

        let store = open_store(base).await.expect("open store");
        assert_eq!(store.mappings().clusters.cluster_for("pv_ground"), Some("Nordfeld"));
        assert!(store.views().get("capacities").is_some());
    }
}
