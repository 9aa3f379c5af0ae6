use serde::{Deserialize, Serialize};

use crate::ClusterId;

/// One geographic cluster from the geometry source. `geometry` is a WKT
/// polygon in SRID 4326.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterSeed {
    pub name: String,
    pub geometry: String,
}

impl ClusterSeed {
    pub fn new(name: impl Into<String>, geometry: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometry: geometry.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub id: ClusterId,
    pub name: String,
    pub geometry: Option<String>,
}
