//! Cache Key Hashing - SHA-256 over Canonical Requests
//!
//! Identical requests must map to identical keys, including requests that
//! differ only by tag order.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

use crate::request::ImageRequest;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    let sorted = sort_value(&v);
    to_string(&sorted)
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let sorted_map: serde_json::Map<String, Value> = sorted
                .into_iter()
                .map(|(k, v)| (k.clone(), sort_value(v)))
                .collect();
            Value::Object(sorted_map)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// The cacheable subset of a request. Tags are sorted and joined so
/// permutations collide; absent optional fields normalize to empty string.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheableFields<'a> {
    title: &'a str,
    description: &'a str,
    template: &'a str,
    theme: &'a str,
    tags: String,
    author: &'a str,
    page_type: &'a str,
    width: u32,
    height: u32,
}

impl<'a> CacheableFields<'a> {
    fn of(request: &'a ImageRequest) -> Self {
        let mut tags: Vec<&str> = request.tags.iter().map(String::as_str).collect();
        tags.sort_unstable();
        Self {
            title: &request.title,
            description: request.description.as_deref().unwrap_or(""),
            template: request.template.as_str(),
            theme: request.theme.as_str(),
            tags: tags.join(","),
            author: request.author.as_deref().unwrap_or(""),
            page_type: request.page_type.as_str(),
            width: request.width,
            height: request.height,
        }
    }
}

/// Compute the content-addressable cache key for a request.
pub fn compute_key(request: &ImageRequest) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(&CacheableFields::of(request))?;
    Ok(sha256_hex(canonical.as_bytes()))
}
