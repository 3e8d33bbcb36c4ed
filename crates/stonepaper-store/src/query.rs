//! Selector queries over JSON documents.
//!
//! Supports the subset of the CouchDB selector language the registry needs:
//! implicit field equality (`{"field": value}`) and the explicit `$eq`
//! operator. Field names may be dotted paths into nested objects. Matching is
//! type-strict: the string `"1"` does not match the number `1`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// A parsed `{"selector": {...}}` query.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Selector {
    selector: Map<String, Value>,
}

impl Selector {
    /// An empty selector (matches every JSON object).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition on `field`.
    pub fn field_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.selector.insert(field.into(), value.into());
        self
    }

    /// Parse a query string.
    pub fn parse(query: &str) -> StoreResult<Self> {
        let parsed: Self =
            serde_json::from_str(query).map_err(|e| StoreError::InvalidQuery(e.to_string()))?;
        for (field, condition) in &parsed.selector {
            if field.is_empty() {
                return Err(StoreError::InvalidQuery("empty field name".into()));
            }
            if field.starts_with('$') {
                return Err(StoreError::InvalidQuery(format!(
                    "unsupported combination operator {field}"
                )));
            }
            if let Value::Object(ops) = condition {
                for op in ops.keys().filter(|k| k.starts_with('$')) {
                    if op != "$eq" {
                        return Err(StoreError::InvalidQuery(format!(
                            "unsupported operator {op} on field {field}"
                        )));
                    }
                }
            }
        }
        Ok(parsed)
    }

    /// Render as a query string accepted by [`Selector::parse`].
    pub fn to_query_string(&self) -> StoreResult<String> {
        serde_json::to_string(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Number of field conditions.
    pub fn len(&self) -> usize {
        self.selector.len()
    }

    /// Returns `true` if the selector has no conditions.
    pub fn is_empty(&self) -> bool {
        self.selector.is_empty()
    }

    /// Whether `document` satisfies every condition.
    pub fn matches(&self, document: &Value) -> bool {
        if !document.is_object() {
            return false;
        }
        self.selector.iter().all(|(field, condition)| {
            let Some(actual) = lookup(document, field) else {
                return false;
            };
            match condition {
                Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => ops
                    .get("$eq")
                    .map(|expected| expected == actual)
                    .unwrap_or(false),
                expected => expected == actual,
            }
        })
    }
}

fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.get(segment))
}

/// One row of a rich-query result set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Record")]
    pub record: Value,
}

impl QueryResult {
    /// Serialize a result set to its wire form.
    pub fn encode_set(results: &[QueryResult]) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(results).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Parse a serialized result set.
    pub fn decode_set(bytes: &[u8]) -> StoreResult<Vec<QueryResult>> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}
