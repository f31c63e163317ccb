//! Remote document database contract.
//!
//! # Responsibility
//! - Define the query/document API the data layer consumes.
//! - Convert between typed models and schemaless document fields.
//!
//! # Invariants
//! - Query results honor filters, then ordering, then `start_after`, then `limit`.
//! - Ordering is total: ties on the order-by fields are broken by document id
//!   in the direction of the last order-by clause.
//! - A document lacking any order-by field is excluded from ordered queries.

use crate::error::{HasMessage, MessageId};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod firestore;
pub mod memory;
mod value;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

pub type RemoteResult<T> = Result<T, RemoteError>;
pub type Fields = Map<String, Value>;

#[derive(Debug)]
pub enum RemoteError {
    /// Request never produced a response (offline, DNS, timeout).
    Transport(String),
    /// Server answered with a non-success status.
    Status { status: u16, message: String },
    NotFound { collection: String, id: String },
    PermissionDenied(String),
    /// Response or stored document did not match the expected shape.
    Decode(String),
    InvalidQuery(String),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "remote request failed: {message}"),
            Self::Status { status, message } => {
                write!(f, "remote store returned {status}: {message}")
            }
            Self::NotFound { collection, id } => write!(f, "document not found: {collection}/{id}"),
            Self::PermissionDenied(message) => write!(f, "permission denied: {message}"),
            Self::Decode(message) => write!(f, "invalid document data: {message}"),
            Self::InvalidQuery(message) => write!(f, "invalid query: {message}"),
        }
    }
}

impl Error for RemoteError {}

impl HasMessage for RemoteError {
    fn message_id(&self) -> MessageId {
        match self {
            Self::Transport(_) => MessageId::NoConnection,
            Self::NotFound { .. } => MessageId::NotFound,
            Self::PermissionDenied(_) => MessageId::PermissionDenied,
            Self::InvalidQuery(_) => MessageId::InvalidInput,
            Self::Status { .. } | Self::Decode(_) => MessageId::Unknown,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else if let Some(status) = value.status() {
            Self::Status {
                status: status.as_u16(),
                message: value.to_string(),
            }
        } else {
            Self::Transport(value.to_string())
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

/// One stored document: id plus schemaless fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Serializes a model into a document; a top-level `id` field is dropped.
    pub fn from_model<T: Serialize>(id: impl Into<String>, model: &T) -> RemoteResult<Self> {
        Ok(Self::new(id, to_fields(model)?))
    }

    /// Deserializes the fields into a model with `id` injected.
    pub fn decode<T: DeserializeOwned>(&self) -> RemoteResult<T> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields)).map_err(|err| {
            RemoteError::Decode(format!("document `{}`: {err}", self.id))
        })
    }

    /// Field lookup supporting dotted paths into nested maps.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

/// Serializes a model into top-level document fields, without `id`.
pub fn to_fields<T: Serialize>(model: &T) -> RemoteResult<Fields> {
    match serde_json::to_value(model)? {
        Value::Object(mut fields) => {
            fields.remove("id");
            Ok(fields)
        }
        other => Err(RemoteError::Decode(format!(
            "expected an object, got `{other}`"
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    ArrayContains,
    In,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl FieldFilter {
    /// Whether `doc` satisfies this filter. Missing fields never match.
    pub fn matches(&self, doc: &Document) -> bool {
        let Some(actual) = doc.get(&self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Equal => compare_values(actual, &self.value) == Ordering::Equal,
            FilterOp::NotEqual => {
                !actual.is_null() && compare_values(actual, &self.value) != Ordering::Equal
            }
            FilterOp::LessThan => same_kind(actual, &self.value)
                && compare_values(actual, &self.value) == Ordering::Less,
            FilterOp::LessThanOrEqual => same_kind(actual, &self.value)
                && compare_values(actual, &self.value) != Ordering::Greater,
            FilterOp::GreaterThan => same_kind(actual, &self.value)
                && compare_values(actual, &self.value) == Ordering::Greater,
            FilterOp::GreaterThanOrEqual => same_kind(actual, &self.value)
                && compare_values(actual, &self.value) != Ordering::Less,
            FilterOp::ArrayContains => actual.as_array().is_some_and(|items| {
                items
                    .iter()
                    .any(|item| compare_values(item, &self.value) == Ordering::Equal)
            }),
            FilterOp::In => self.value.as_array().is_some_and(|candidates| {
                candidates
                    .iter()
                    .any(|candidate| compare_values(actual, candidate) == Ordering::Equal)
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Continuation point: order-by values and id of the last document seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageCursor {
    pub values: Vec<Value>,
    pub document_id: String,
}

impl PageCursor {
    /// Captures the cursor position of `doc` under `order_by`.
    pub fn from_document(doc: &Document, order_by: &[OrderBy]) -> Self {
        Self {
            values: order_by
                .iter()
                .map(|order| doc.get(&order.field).cloned().unwrap_or(Value::Null))
                .collect(),
            document_id: doc.id.clone(),
        }
    }
}

/// Structured query over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<FieldFilter>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u32>,
    pub start_after: Option<PageCursor>,
}

impl Query {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            start_after: None,
        }
    }

    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Equal, value)
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_after(mut self, cursor: Option<PageCursor>) -> Self {
        self.start_after = cursor;
        self
    }

    pub fn validate(&self) -> RemoteResult<()> {
        if self.collection.trim().is_empty() {
            return Err(RemoteError::InvalidQuery("collection is empty".to_string()));
        }
        if let Some(cursor) = &self.start_after {
            if cursor.values.len() != self.order_by.len() {
                return Err(RemoteError::InvalidQuery(format!(
                    "cursor has {} values for {} order-by clauses",
                    cursor.values.len(),
                    self.order_by.len()
                )));
            }
        }
        if self
            .filters
            .iter()
            .any(|filter| filter.op == FilterOp::In && !filter.value.is_array())
        {
            return Err(RemoteError::InvalidQuery(
                "`in` filter requires an array value".to_string(),
            ));
        }
        Ok(())
    }

    /// Ordering of two documents under this query, id as final tiebreak.
    pub fn compare(&self, left: &Document, right: &Document) -> Ordering {
        for order in &self.order_by {
            let ordering = compare_optional(left.get(&order.field), right.get(&order.field));
            let ordering = apply_direction(ordering, order.direction);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        apply_direction(left.id.cmp(&right.id), self.tiebreak_direction())
    }

    /// Whether `doc` sorts strictly after `cursor` under this query.
    pub fn is_after(&self, doc: &Document, cursor: &PageCursor) -> bool {
        for (order, cursor_value) in self.order_by.iter().zip(&cursor.values) {
            let ordering = compare_optional(doc.get(&order.field), Some(cursor_value));
            let ordering = apply_direction(ordering, order.direction);
            if ordering != Ordering::Equal {
                return ordering == Ordering::Greater;
            }
        }
        apply_direction(doc.id.cmp(&cursor.document_id), self.tiebreak_direction())
            == Ordering::Greater
    }

    pub(crate) fn tiebreak_direction(&self) -> Direction {
        self.order_by
            .last()
            .map_or(Direction::Ascending, |order| order.direction)
    }
}

/// Remote document database used by every data-layer adapter.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> RemoteResult<Option<Document>>;
    /// Creates or fully replaces a document.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> RemoteResult<()>;
    /// Creates a document with a store-generated id and returns the id.
    async fn add(&self, collection: &str, fields: Fields) -> RemoteResult<String>;
    /// Merges top-level `fields` into an existing document.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> RemoteResult<()>;
    /// Deletes a document; deleting a missing document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> RemoteResult<()>;
    async fn query(&self, query: &Query) -> RemoteResult<Vec<Document>>;
    /// Number of documents matching the query filters.
    async fn count(&self, query: &Query) -> RemoteResult<u64>;

    /// Installs or clears the bearer token of the signed-in user.
    fn set_auth_token(&self, _token: Option<String>) {}
}

fn apply_direction(ordering: Ordering, direction: Direction) -> Ordering {
    match direction {
        Direction::Ascending => ordering,
        Direction::Descending => ordering.reverse(),
    }
}

fn compare_optional(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => compare_values(left, right),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn same_kind(left: &Value, right: &Value) -> bool {
    type_rank(left) == type_rank(right)
}

/// Total order over field values: null < bool < number < string < array < map.
pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Bool(left), Value::Bool(right)) => left.cmp(right),
        (Value::Number(left), Value::Number(right)) => {
            match (left.as_i64(), right.as_i64()) {
                (Some(left), Some(right)) => left.cmp(&right),
                _ => {
                    let left = left.as_f64().unwrap_or(f64::NAN);
                    let right = right.as_f64().unwrap_or(f64::NAN);
                    left.total_cmp(&right)
                }
            }
        }
        (Value::String(left), Value::String(right)) => left.cmp(right),
        (Value::Array(left), Value::Array(right)) => {
            for (left, right) in left.iter().zip(right) {
                let ordering = compare_values(left, right);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            left.len().cmp(&right.len())
        }
        (Value::Object(left), Value::Object(right)) => {
            let mut left_entries: Vec<_> = left.iter().collect();
            let mut right_entries: Vec<_> = right.iter().collect();
            left_entries.sort_by(|a, b| a.0.cmp(b.0));
            right_entries.sort_by(|a, b| a.0.cmp(b.0));
            for ((left_key, left_value), (right_key, right_value)) in
                left_entries.iter().zip(&right_entries)
            {
                let ordering = left_key
                    .cmp(right_key)
                    .then_with(|| compare_values(left_value, right_value));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            left_entries.len().cmp(&right_entries.len())
        }
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

#[cfg(test)]
mod tests {
    use super::{compare_values, Direction, Document, FilterOp, PageCursor, Query};
    use serde_json::json;
    use std::cmp::Ordering;

    fn doc(id: &str, fields: serde_json::Value) -> Document {
        Document::new(id, fields.as_object().cloned().unwrap())
    }

    #[test]
    fn numbers_compare_across_integer_and_float() {
        assert_eq!(compare_values(&json!(2), &json!(2.5)), Ordering::Less);
        assert_eq!(compare_values(&json!(3), &json!(3)), Ordering::Equal);
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!("a"), &json!(10)), Ordering::Greater);
    }

    #[test]
    fn range_filters_do_not_match_other_types() {
        let query = Query::collection("pets").filter("ageMonths", FilterOp::LessThan, 12);
        assert!(!query.filters[0].matches(&doc("a", json!({ "ageMonths": "young" }))));
        assert!(query.filters[0].matches(&doc("b", json!({ "ageMonths": 6 }))));
        assert!(!query.filters[0].matches(&doc("c", json!({}))));
    }

    #[test]
    fn dotted_paths_reach_nested_fields() {
        let document = doc("a", json!({ "location": { "latitude": 30.0 } }));
        assert_eq!(document.get("location.latitude"), Some(&json!(30.0)));
        assert_eq!(document.get("location.longitude"), None);
    }

    #[test]
    fn cursor_comparison_breaks_ties_by_id_in_last_direction() {
        let query = Query::collection("pets").order_by("createdAt", Direction::Descending);
        let first = doc("b", json!({ "createdAt": 10 }));
        let second = doc("a", json!({ "createdAt": 10 }));
        assert_eq!(query.compare(&first, &second), Ordering::Less);

        let cursor = PageCursor::from_document(&first, &query.order_by);
        assert!(query.is_after(&second, &cursor));
        assert!(!query.is_after(&first, &cursor));
    }

    #[test]
    fn validate_rejects_mismatched_cursor() {
        let query = Query::collection("pets").start_after(Some(PageCursor {
            values: vec![json!(1)],
            document_id: "x".to_string(),
        }));
        assert!(query.validate().is_err());
    }
}
