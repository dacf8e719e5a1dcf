//! Casting and conformance of documents against a schema.
//! Writes are strict: undeclared keys are dropped, declared ones are cast to their type.

use crate::error::AppError;
use crate::schema::{FieldDescriptor, FieldType, Schema};
use crate::store::{Document, Query, ID_FIELD};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::Value;

fn type_error(field: &FieldDescriptor) -> AppError {
    AppError::Validation(format!("{} must be of type {}", field.name, field.type_))
}

/// Cast one non-null value toward the field's declared type.
pub fn cast_value(field: &FieldDescriptor, value: Value) -> Result<Value, AppError> {
    match (field.type_, value) {
        (FieldType::Mixed, v) => Ok(v),
        (_, Value::Null) => Ok(Value::Null),
        (FieldType::String, Value::String(s)) => Ok(Value::String(s)),
        (FieldType::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
        (FieldType::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),
        (FieldType::Number, Value::Number(n)) => Ok(Value::Number(n)),
        (FieldType::Number, Value::String(s)) => parse_number(s.trim()).ok_or_else(|| type_error(field)),
        (FieldType::Integer, Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                return Ok(Value::Number(n));
            }
            n.as_f64()
                .and_then(integral)
                .ok_or_else(|| type_error(field))
        }
        (FieldType::Integer, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| type_error(field)),
        (FieldType::Boolean, Value::Bool(b)) => Ok(Value::Bool(b)),
        (FieldType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Value::Bool(true)),
            "false" | "0" | "no" => Ok(Value::Bool(false)),
            _ => Err(type_error(field)),
        },
        (FieldType::Boolean, Value::Number(n)) => match n.as_f64() {
            Some(f) if f == 1.0 => Ok(Value::Bool(true)),
            Some(f) if f == 0.0 => Ok(Value::Bool(false)),
            _ => Err(type_error(field)),
        },
        (FieldType::Date, Value::String(s)) => parse_date(s.trim())
            .map(|d| Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)))
            .ok_or_else(|| type_error(field)),
        (FieldType::Date, Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|d| Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)))
            .ok_or_else(|| type_error(field)),
        (FieldType::Array, Value::Array(a)) => Ok(Value::Array(a)),
        (FieldType::Array, v @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => Ok(Value::Array(vec![v])),
        (FieldType::Object, Value::Object(m)) => Ok(Value::Object(m)),
        _ => Err(type_error(field)),
    }
}

fn parse_number(s: &str) -> Option<Value> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    s.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

fn integral(f: f64) -> Option<Value> {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some(Value::from(f as i64))
    } else {
        None
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Full conformance for create and save: apply defaults, enforce required, cast, drop undeclared keys.
/// Output keeps `_id` (if present) first, then schema field order.
pub fn conform_document(schema: &Schema, mut doc: Document) -> Result<Document, AppError> {
    let mut out = Document::new();
    if let Some(id) = doc.remove(ID_FIELD) {
        out.insert(ID_FIELD.to_string(), id);
    }
    for field in &schema.fields {
        let value = match doc.remove(&field.name) {
            None | Some(Value::Null) if field.default.is_some() => field.default.clone(),
            other => other,
        };
        match value {
            None | Some(Value::Null) if field.required => {
                return Err(AppError::Validation(format!("{} is required", field.name)));
            }
            None => {}
            Some(v) => {
                out.insert(field.name.clone(), cast_value(field, v)?);
            }
        }
    }
    Ok(out)
}

/// Conformance for raw updates: only keys present are cast; `_id` and undeclared keys are dropped.
pub fn conform_changes(schema: &Schema, changes: Document) -> Result<Document, AppError> {
    let mut out = Document::new();
    for (key, value) in changes {
        let Some(field) = schema.get(&key) else {
            continue;
        };
        if value.is_null() && field.required {
            return Err(AppError::Validation(format!("{} is required", field.name)));
        }
        out.insert(key, cast_value(field, value)?);
    }
    Ok(out)
}

/// Best-effort cast of an equality filter. Values that fail to cast are kept verbatim and simply match nothing.
pub fn cast_query(schema: &Schema, query: Query) -> Query {
    query
        .into_iter()
        .map(|(key, value)| {
            let value = match schema.get(&key) {
                Some(field) => cast_value(field, value.clone()).unwrap_or(value),
                None => value,
            };
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new()
            .field(FieldDescriptor::new("title", FieldType::String).required())
            .field(FieldDescriptor::new("count", FieldType::Integer).with_default(json!(0)))
            .field(FieldDescriptor::new("price", FieldType::Number))
            .field(FieldDescriptor::new("done", FieldType::Boolean))
            .field(FieldDescriptor::new("due", FieldType::Date))
            .field(FieldDescriptor::new("tags", FieldType::Array))
    }

    fn doc(v: Value) -> Document {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn casts_form_strings_to_declared_types() {
        let out = conform_document(
            &schema(),
            doc(json!({"title": "a", "count": "3", "price": "2.5", "done": "true", "due": "2024-02-01", "tags": "x"})),
        )
        .unwrap();
        assert_eq!(out["count"], json!(3));
        assert_eq!(out["price"], json!(2.5));
        assert_eq!(out["done"], json!(true));
        assert_eq!(out["due"], json!("2024-02-01T00:00:00.000Z"));
        assert_eq!(out["tags"], json!(["x"]));
    }

    #[test]
    fn required_and_defaults() {
        let err = conform_document(&schema(), doc(json!({"count": 1}))).unwrap_err();
        assert_eq!(err.to_string(), "title is required");

        let out = conform_document(&schema(), doc(json!({"title": "a"}))).unwrap();
        assert_eq!(out["count"], json!(0));
        assert!(!out.contains_key("price"));
    }

    #[test]
    fn drops_undeclared_keys_but_keeps_id() {
        let out = conform_document(&schema(), doc(json!({"_id": "abc", "title": "a", "extra": 1}))).unwrap();
        assert_eq!(out.keys().next().map(String::as_str), Some("_id"));
        assert!(!out.contains_key("extra"));
    }

    #[test]
    fn rejects_uncastable_values() {
        let err = conform_document(&schema(), doc(json!({"title": "a", "count": "many"}))).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), "count must be of type integer");
        assert!(conform_document(&schema(), doc(json!({"title": {"x": 1}}))).is_err());
    }

    #[test]
    fn changes_only_touch_present_keys() {
        let out = conform_changes(&schema(), doc(json!({"_id": "z", "done": "0", "nope": 1}))).unwrap();
        assert_eq!(out, doc(json!({"done": false})));
        assert!(conform_changes(&schema(), doc(json!({"title": null}))).is_err());
    }

    #[test]
    fn query_cast_is_best_effort() {
        let q = cast_query(&schema(), doc(json!({"count": "4", "done": "maybe", "other": "v"})));
        assert_eq!(q["count"], json!(4));
        assert_eq!(q["done"], json!("maybe"));
        assert_eq!(q["other"], json!("v"));
    }
}
