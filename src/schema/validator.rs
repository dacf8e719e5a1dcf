//! Registration-time schema validation: field names and defaults are checked once, not per request.

use crate::error::ConfigError;
use crate::schema::{cast_value, Schema};
use crate::store::ID_FIELD;
use std::collections::HashSet;

pub fn validate_schema(service: &str, schema: &Schema) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidSchema {
        service: service.to_string(),
        reason,
    };
    if schema.fields.is_empty() {
        return Err(invalid("at least one field required".into()));
    }
    let mut names = HashSet::new();
    for field in &schema.fields {
        if field.name.trim().is_empty() {
            return Err(invalid("field name must not be empty".into()));
        }
        if field.name == ID_FIELD {
            return Err(invalid(format!("{} is assigned by the store and cannot be declared", ID_FIELD)));
        }
        if !names.insert(field.name.as_str()) {
            return Err(invalid(format!("duplicate field: {}", field.name)));
        }
        if let Some(default) = &field.default {
            if cast_value(field, default.clone()).is_err() {
                return Err(invalid(format!(
                    "default for {} is not a valid {}",
                    field.name, field.type_
                )));
            }
        }
    }
    Ok(())
}
