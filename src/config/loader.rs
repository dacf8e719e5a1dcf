//! Load service definitions (name + schema) from a JSON file and validate them before registration.

use crate::error::ConfigError;
use crate::schema::{validate_schema, Schema};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
    pub schema: Schema,
}

/// Read a JSON array of `{ "name": ..., "schema": { "fields": [...] } }` and validate it.
pub async fn load_definitions(path: impl AsRef<Path>) -> Result<Vec<ServiceDefinition>, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let definitions: Vec<ServiceDefinition> =
        serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    validate_definitions(&definitions)?;
    Ok(definitions)
}

/// Unique names and well-formed schemas across the whole file.
pub fn validate_definitions(definitions: &[ServiceDefinition]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for def in definitions {
        if !names.insert(def.name.as_str()) {
            return Err(ConfigError::DuplicateService(def.name.clone()));
        }
        validate_schema(&def.name, &def.schema)?;
    }
    Ok(())
}
