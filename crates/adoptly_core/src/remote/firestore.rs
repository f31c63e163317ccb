//! Firestore REST implementation of `DocumentStore`.
//!
//! # Responsibility
//! - Translate document/query calls into Firestore v1 REST requests.
//! - Map HTTP outcomes to `RemoteError` variants.
//!
//! # Invariants
//! - Every ordered query appends an explicit `__name__` order clause so the
//!   cursor tiebreak matches `Query::compare`.
//! - The bearer token is sent only when a user is signed in.

use super::value::{decode_fields, encode_fields, encode_value};
use super::{
    Direction, Document, DocumentStore, FieldFilter, Fields, FilterOp, Query, RemoteError,
    RemoteResult,
};
use crate::config::FirebaseConfig;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const COUNT_ALIAS: &str = "total";

pub struct FirestoreStore {
    http: Client,
    /// `projects/{project}/databases/(default)/documents`
    documents_path: String,
    /// `{base_url}/v1/` + `documents_path`
    documents_url: String,
    id_token: RwLock<Option<String>>,
}

impl FirestoreStore {
    pub fn new(config: &FirebaseConfig) -> RemoteResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(RemoteError::from)?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: Client, config: &FirebaseConfig) -> Self {
        let documents_path = format!(
            "projects/{}/databases/(default)/documents",
            config.project_id
        );
        let documents_url = format!(
            "{}/v1/{documents_path}",
            config.firestore_base_url.trim_end_matches('/')
        );
        Self {
            http,
            documents_path,
            documents_url,
            id_token: RwLock::new(None),
        }
    }

    fn document_url(&self, collection: &str, id: Option<&str>) -> RemoteResult<Url> {
        let mut url = Url::parse(&self.documents_url)
            .map_err(|err| RemoteError::InvalidQuery(format!("bad firestore url: {err}")))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| RemoteError::InvalidQuery("firestore url cannot be a base".into()))?;
            segments.push(collection);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn rpc_url(&self, method: &str) -> RemoteResult<Url> {
        Url::parse(&format!("{}:{method}", self.documents_url))
            .map_err(|err| RemoteError::InvalidQuery(format!("bad firestore url: {err}")))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .id_token
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default();
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, op: &str, request: RequestBuilder) -> RemoteResult<Response> {
        let started_at = Instant::now();
        let response = self.authorize(request).send().await.map_err(|err| {
            warn!(
                "event=remote_request module=remote status=error op={op} duration_ms={} error_code=transport",
                started_at.elapsed().as_millis()
            );
            RemoteError::from(err)
        })?;
        debug!(
            "event=remote_request module=remote status=ok op={op} http_status={} duration_ms={}",
            response.status().as_u16(),
            started_at.elapsed().as_millis()
        );
        Ok(response)
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.documents_path)
    }

    fn structured_query(&self, query: &Query, with_cursor: bool) -> Value {
        let mut structured = json!({ "from": [{ "collectionId": query.collection }] });

        let filters: Vec<Value> = query.filters.iter().map(encode_filter).collect();
        match filters.len() {
            0 => {}
            1 => structured["where"] = filters.into_iter().next().unwrap_or(Value::Null),
            _ => {
                structured["where"] = json!({
                    "compositeFilter": { "op": "AND", "filters": filters }
                })
            }
        }

        if !query.order_by.is_empty() {
            let mut orders: Vec<Value> = query
                .order_by
                .iter()
                .map(|order| {
                    json!({
                        "field": { "fieldPath": order.field },
                        "direction": direction_name(order.direction),
                    })
                })
                .collect();
            orders.push(json!({
                "field": { "fieldPath": "__name__" },
                "direction": direction_name(query.tiebreak_direction()),
            }));
            structured["orderBy"] = Value::Array(orders);
        }

        if with_cursor {
            if let Some(cursor) = &query.start_after {
                let mut values: Vec<Value> = cursor.values.iter().map(encode_value).collect();
                values.push(json!({
                    "referenceValue": self.document_name(&query.collection, &cursor.document_id)
                }));
                structured["startAt"] = json!({ "values": values, "before": false });
            }
            if let Some(limit) = query.limit {
                structured["limit"] = json!(limit);
            }
        }

        structured
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, collection: &str, id: &str) -> RemoteResult<Option<Document>> {
        let url = self.document_url(collection, Some(id))?;
        let response = self.send("get", self.http.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = read_json(response).await?;
        Ok(Some(parse_document(&body)?))
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> RemoteResult<()> {
        let url = self.document_url(collection, Some(id))?;
        let body = json!({ "fields": encode_fields(&fields) });
        let response = self.send("set", self.http.patch(url).json(&body)).await?;
        read_json(response).await.map(|_| ())
    }

    async fn add(&self, collection: &str, fields: Fields) -> RemoteResult<String> {
        let url = self.document_url(collection, None)?;
        let body = json!({ "fields": encode_fields(&fields) });
        let response = self.send("add", self.http.post(url).json(&body)).await?;
        let created = parse_document(&read_json(response).await?)?;
        Ok(created.id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> RemoteResult<()> {
        let mut url = self.document_url(collection, Some(id))?;
        {
            let mut pairs = url.query_pairs_mut();
            for key in fields.keys() {
                pairs.append_pair("updateMask.fieldPaths", key);
            }
            pairs.append_pair("currentDocument.exists", "true");
        }
        let body = json!({ "fields": encode_fields(&fields) });
        let response = self.send("update", self.http.patch(url).json(&body)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        read_json(response).await.map(|_| ())
    }

    async fn delete(&self, collection: &str, id: &str) -> RemoteResult<()> {
        let url = self.document_url(collection, Some(id))?;
        let response = self.send("delete", self.http.delete(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        read_json(response).await.map(|_| ())
    }

    async fn query(&self, query: &Query) -> RemoteResult<Vec<Document>> {
        query.validate()?;
        let url = self.rpc_url("runQuery")?;
        let body = json!({ "structuredQuery": self.structured_query(query, true) });
        let response = self.send("query", self.http.post(url).json(&body)).await?;
        let rows = read_json(response).await?;

        let Some(rows) = rows.as_array() else {
            return Err(RemoteError::Decode("runQuery response is not an array".into()));
        };
        rows.iter()
            .filter_map(|row| row.get("document"))
            .map(parse_document)
            .collect()
    }

    async fn count(&self, query: &Query) -> RemoteResult<u64> {
        query.validate()?;
        let url = self.rpc_url("runAggregationQuery")?;
        let body = json!({
            "structuredAggregationQuery": {
                "structuredQuery": self.structured_query(query, false),
                "aggregations": [{ "alias": COUNT_ALIAS, "count": {} }],
            }
        });
        let response = self.send("count", self.http.post(url).json(&body)).await?;
        let rows = read_json(response).await?;

        let count = rows
            .as_array()
            .and_then(|rows| rows.first())
            .and_then(|row| row.pointer(&format!("/result/aggregateFields/{COUNT_ALIAS}/integerValue")))
            .ok_or_else(|| RemoteError::Decode("aggregation result missing count".into()))?;
        match count {
            Value::String(text) => text
                .parse::<u64>()
                .map_err(|err| RemoteError::Decode(format!("count `{text}`: {err}"))),
            Value::Number(number) => number
                .as_u64()
                .ok_or_else(|| RemoteError::Decode(format!("count `{number}`"))),
            other => Err(RemoteError::Decode(format!("count `{other}`"))),
        }
    }

    fn set_auth_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.id_token.write() {
            *guard = token;
        }
    }
}

fn encode_filter(filter: &FieldFilter) -> Value {
    json!({
        "fieldFilter": {
            "field": { "fieldPath": filter.field },
            "op": filter_op_name(filter.op),
            "value": encode_value(&filter.value),
        }
    })
}

fn filter_op_name(op: FilterOp) -> &'static str {
    match op {
        FilterOp::Equal => "EQUAL",
        FilterOp::NotEqual => "NOT_EQUAL",
        FilterOp::LessThan => "LESS_THAN",
        FilterOp::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
        FilterOp::GreaterThan => "GREATER_THAN",
        FilterOp::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
        FilterOp::ArrayContains => "ARRAY_CONTAINS",
        FilterOp::In => "IN",
    }
}

fn direction_name(direction: Direction) -> &'static str {
    match direction {
        Direction::Ascending => "ASCENDING",
        Direction::Descending => "DESCENDING",
    }
}

async fn read_json(response: Response) -> RemoteResult<Value> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<Value>().await?);
    }

    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| {
            body.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| status.to_string());

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::PermissionDenied(message),
        _ => RemoteError::Status {
            status: status.as_u16(),
            message,
        },
    })
}

fn parse_document(value: &Value) -> RemoteResult<Document> {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| RemoteError::Decode("document without name".into()))?;
    let id = name.rsplit('/').next().unwrap_or(name);
    let fields = match value.get("fields").and_then(Value::as_object) {
        Some(fields) => decode_fields(fields)?,
        None => Fields::new(),
    };
    Ok(Document::new(id, fields))
}
