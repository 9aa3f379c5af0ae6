use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ResqError, ResqResult};

/// A named aggregate query. The body is opaque SQL; only its name is checked,
/// since it ends up as an identifier in DDL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDefinition {
    pub name: String,
    pub query: String,
}

impl ViewDefinition {
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> ResqResult<Self> {
        let name = name.into();
        validate_view_name(&name)?;
        Ok(Self {
            name,
            query: query.into().replace(';', "").trim().to_string(),
        })
    }
}

pub fn validate_view_name(name: &str) -> ResqResult<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ResqError::validation(format!("invalid view name '{name}'")))
    }
}

/// Ordered set of view definitions. Order is the application order for
/// `refresh_all`; teardown walks it backwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewCatalog {
    definitions: Vec<ViewDefinition>,
}

impl ViewCatalog {
    pub fn new(definitions: Vec<ViewDefinition>) -> ResqResult<Self> {
        for (idx, definition) in definitions.iter().enumerate() {
            if definitions[..idx]
                .iter()
                .any(|other| other.name == definition.name)
            {
                return Err(ResqError::validation(format!(
                    "view '{}' defined twice",
                    definition.name
                )));
            }
        }
        Ok(Self { definitions })
    }

    /// Reads every `*.sql` file in `dir`, ordered by file name. The file stem
    /// becomes the view name. A missing directory is an empty catalog.
    pub fn load_dir(dir: &Path) -> ResqResult<Self> {
        if !dir.exists() {
            return Ok(Self::default());
        }
        let entries = fs::read_dir(dir)
            .map_err(|err| ResqError::storage(format!("read views dir: {err}")))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| ResqError::storage(format!("read views dir: {err}")))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("sql") {
                paths.push(path);
            }
        }
        paths.sort();
        let mut definitions = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let query = fs::read_to_string(&path)
                .map_err(|err| ResqError::storage(format!("read {}: {err}", path.display())))?;
            definitions.push(ViewDefinition::new(name, query)?);
        }
        Self::new(definitions)
    }

    pub fn get(&self, name: &str) -> Option<&ViewDefinition> {
        self.definitions.iter().find(|definition| definition.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
