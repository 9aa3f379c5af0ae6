//! Static component mappings loaded once at startup.
//!
//! The mappings are plain values: they are built from JSON files (or in memory
//! for tests) and handed to the store, which never reloads them.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ResqError, ResqResult};

pub const CLUSTERS_FILE: &str = "clusters.json";
pub const LABELS_FILE: &str = "labels.json";
pub const CATEGORIES_FILE: &str = "categories.json";

/// Reverse index from component name to cluster name.
#[derive(Clone, Debug, Default)]
pub struct ClusterMap {
    by_component: HashMap<String, String>,
}

impl ClusterMap {
    /// Builds the reverse index, failing if one component is listed under two
    /// different clusters. Clusters are visited in name order, so `first` in the
    /// error is always the alphabetically smaller cluster.
    pub fn from_clusters(clusters: BTreeMap<String, Vec<String>>) -> ResqResult<Self> {
        let mut by_component: HashMap<String, String> = HashMap::new();
        for (cluster, components) in clusters {
            for component in components {
                match by_component.get(&component) {
                    Some(existing) if existing != &cluster => {
                        return Err(ResqError::ClusterConflict {
                            component,
                            first: existing.clone(),
                            second: cluster,
                        });
                    }
                    Some(_) => {}
                    None => {
                        by_component.insert(component, cluster.clone());
                    }
                }
            }
        }
        Ok(Self { by_component })
    }

    pub fn from_json(raw: &str) -> ResqResult<Self> {
        let clusters: BTreeMap<String, Vec<String>> = serde_json::from_str(raw)
            .map_err(|err| ResqError::validation(format!("cluster mapping: {err}")))?;
        Self::from_clusters(clusters)
    }

    pub fn cluster_for(&self, component: &str) -> Option<&str> {
        self.by_component.get(component).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_component.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_component.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub label: String,
    #[serde(rename = "bus")]
    pub is_bus: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub category: String,
    pub carrier: String,
    pub is_renewable: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryKey {
    pub from_node: String,
    pub to_node: Option<String>,
}

impl CategoryKey {
    /// Parses the `from|to` keys used by the categories file. A missing or
    /// empty `to` part means the category applies to a single node.
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.splitn(2, '|');
        let from_node = parts.next().unwrap_or_default().trim().to_string();
        let to_node = parts
            .next()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string);
        Self { from_node, to_node }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Mappings {
    pub clusters: ClusterMap,
    pub labels: BTreeMap<String, LabelEntry>,
    pub categories: BTreeMap<CategoryKey, CategoryEntry>,
}

impl Mappings {
    pub fn with_clusters(clusters: ClusterMap) -> Self {
        Self {
            clusters,
            ..Self::default()
        }
    }

    /// Loads `clusters.json`, `labels.json` and `categories.json` from `dir`.
    /// Absent files produce empty mappings; malformed files and cluster
    /// conflicts are errors.
    pub fn load(dir: &Path) -> ResqResult<Self> {
        let clusters = match read_optional(&dir.join(CLUSTERS_FILE))? {
            Some(raw) => ClusterMap::from_json(&raw)?,
            None => {
                log::warn!("no cluster mapping in {}; results stay unattributed", dir.display());
                ClusterMap::default()
            }
        };
        let labels = match read_optional(&dir.join(LABELS_FILE))? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|err| ResqError::validation(format!("label mapping: {err}")))?,
            None => BTreeMap::new(),
        };
        let categories = match read_optional(&dir.join(CATEGORIES_FILE))? {
            Some(raw) => parse_categories(&raw)?,
            None => BTreeMap::new(),
        };
        Ok(Self {
            clusters,
            labels,
            categories,
        })
    }
}

fn parse_categories(raw: &str) -> ResqResult<BTreeMap<CategoryKey, CategoryEntry>> {
    let entries: BTreeMap<String, CategoryEntry> = serde_json::from_str(raw)
        .map_err(|err| ResqError::validation(format!("category mapping: {err}")))?;
    Ok(entries
        .into_iter()
        .map(|(key, entry)| (CategoryKey::parse(&key), entry))
        .collect())
}

fn read_optional(path: &Path) -> ResqResult<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|err| ResqError::storage(format!("read {}: {err}", path.display())))
}
