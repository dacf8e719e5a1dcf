//! Request body as a field map, from either JSON or a URL-encoded form.

use crate::error::AppError;
use crate::store::Document;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use serde_json::Value;

/// Structured body. An empty body yields an empty map. Form values arrive as strings,
/// with bracket keys expanded by [`pairs_to_document`].
#[derive(Clone, Debug, Default)]
pub struct Payload(pub Document);

fn media_type(req: &Request) -> Option<String> {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(';').next())
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
}

fn is_json(media: &str) -> bool {
    media == "application/json" || (media.starts_with("application/") && media.ends_with("+json"))
}

enum Segment {
    Key(String),
    Index(usize),
    Push,
}

/// Split `name[a][0][]` into its segments. `None` for a key that is not a well-formed bracket path.
fn key_path(key: &str) -> Option<(String, Vec<Segment>)> {
    let open = key.find('[')?;
    let (name, mut rest) = key.split_at(open);
    if name.is_empty() {
        return None;
    }
    let mut segments = Vec::new();
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        let part = &inner[..close];
        segments.push(if part.is_empty() {
            Segment::Push
        } else if let Ok(i) = part.parse::<usize>() {
            Segment::Index(i)
        } else {
            Segment::Key(part.to_string())
        });
        rest = &inner[close + 1..];
    }
    Some((name.to_string(), segments))
}

/// Store `value` at a leaf; a leaf that already holds a scalar becomes an array of both.
fn place_leaf(slot: &mut Value, value: Value) {
    match slot {
        Value::Null => *slot = value,
        Value::Array(items) => items.push(value),
        Value::Object(_) => {}
        existing => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

/// Walk `segments` below `slot`, creating objects and arrays on the way.
/// A pair whose path collides with a value of another shape is dropped.
fn place(slot: &mut Value, segments: &[Segment], value: Value) {
    let Some((head, tail)) = segments.split_first() else {
        place_leaf(slot, value);
        return;
    };
    if slot.is_null() {
        *slot = match head {
            Segment::Key(_) => Value::Object(Document::new()),
            Segment::Index(_) | Segment::Push => Value::Array(Vec::new()),
        };
    }
    match (head, slot) {
        (Segment::Key(k), Value::Object(map)) => {
            place(map.entry(k.clone()).or_insert(Value::Null), tail, value);
        }
        (Segment::Index(i), Value::Array(items)) if *i < items.len() => place(&mut items[*i], tail, value),
        (Segment::Index(_) | Segment::Push, Value::Array(items)) => {
            items.push(Value::Null);
            if let Some(last) = items.last_mut() {
                place(last, tail, value);
            }
        }
        _ => {}
    }
}

/// Collapse key/value pairs into a document. A repeated key accumulates into an array;
/// bracket keys nest: `tags[]=a&tags[]=b` is an array, `meta[x]=1` an object.
pub fn pairs_to_document(pairs: Vec<(String, String)>) -> Document {
    let mut doc = Document::new();
    for (key, value) in pairs {
        let value = Value::String(value);
        let (name, segments) = key_path(&key).unwrap_or_else(|| (key.clone(), Vec::new()));
        place(doc.entry(name).or_insert(Value::Null), &segments, value);
    }
    doc
}

#[async_trait]
impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let media = media_type(&req);
        if media.as_deref() == Some("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state).await?;
            return Ok(Payload(pairs_to_document(pairs)));
        }

        let bytes = Bytes::from_request(req, state).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Payload(Document::new()));
        }
        match media {
            Some(m) if is_json(&m) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(Value::Object(map)) => Ok(Payload(map)),
                Ok(_) => Err(AppError::BadRequest("body must be a JSON object".into())),
                Err(e) => Err(AppError::BadRequest(format!("invalid JSON: {}", e))),
            },
            Some(m) => Err(AppError::UnsupportedMediaType(m)),
            None => Err(AppError::UnsupportedMediaType("none".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde_json::json;

    async fn extract(content_type: Option<&str>, body: &'static str) -> Result<Document, AppError> {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        let req = builder.body(Body::from(body)).unwrap();
        Payload::from_request(req, &()).await.map(|p| p.0)
    }

    #[tokio::test]
    async fn json_object_body() {
        let doc = extract(Some("application/json; charset=utf-8"), r#"{"a": 1}"#).await.unwrap();
        assert_eq!(doc["a"], json!(1));
    }

    #[tokio::test]
    async fn form_body_with_repeated_key() {
        let doc = extract(Some("application/x-www-form-urlencoded"), "a=1&t=x&t=y").await.unwrap();
        assert_eq!(doc["a"], json!("1"));
        assert_eq!(doc["t"], json!(["x", "y"]));
    }

    #[tokio::test]
    async fn form_bracket_keys_nest() {
        let doc = extract(
            Some("application/x-www-form-urlencoded"),
            "tags%5B%5D=a&tags%5B%5D=b&meta%5Bx%5D=1&meta%5By%5D%5Bz%5D=2&items%5B0%5D%5Bn%5D=p&items%5B0%5D%5Bq%5D=3",
        )
        .await
        .unwrap();
        assert_eq!(doc["tags"], json!(["a", "b"]));
        assert_eq!(doc["meta"], json!({"x": "1", "y": {"z": "2"}}));
        assert_eq!(doc["items"], json!([{"n": "p", "q": "3"}]));
    }

    #[test]
    fn malformed_bracket_keys_stay_literal() {
        let doc = pairs_to_document(vec![
            ("a[b".into(), "1".into()),
            ("[x]".into(), "2".into()),
            ("c[d]e".into(), "3".into()),
            ("m[k]".into(), "4".into()),
            ("m".into(), "5".into()),
        ]);
        assert_eq!(doc["a[b"], json!("1"));
        assert_eq!(doc["[x]"], json!("2"));
        assert_eq!(doc["c[d]e"], json!("3"));
        assert_eq!(doc["m"], json!({"k": "4"}));
    }

    #[tokio::test]
    async fn empty_body_is_empty_map() {
        assert!(extract(None, "").await.unwrap().is_empty());
        assert!(extract(Some("application/json"), "  ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_non_object_and_unknown_types() {
        assert!(matches!(extract(Some("application/json"), "[1]").await, Err(AppError::BadRequest(_))));
        assert!(matches!(extract(Some("application/json"), "{").await, Err(AppError::BadRequest(_))));
        assert!(matches!(
            extract(Some("text/plain"), "hi").await,
            Err(AppError::UnsupportedMediaType(_))
        ));
    }
}
