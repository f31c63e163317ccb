//! Firestore typed-value encoding.
//!
//! Firestore REST wraps every field in a one-key object naming its type
//! (`{"stringValue": "x"}`, `{"integerValue": "3"}`, …). Integers travel as
//! decimal strings.

use super::{Fields, RemoteError, RemoteResult};
use serde_json::{json, Map, Value};

pub(crate) fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                json!({ "integerValue": int.to_string() })
            } else if let Some(int) = number.as_u64() {
                json!({ "integerValue": int.to_string() })
            } else {
                json!({ "doubleValue": number.as_f64().unwrap_or(0.0) })
            }
        }
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => {
            if items.is_empty() {
                json!({ "arrayValue": {} })
            } else {
                json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
            }
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

pub(crate) fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect(),
    )
}

pub(crate) fn decode_value(value: &Value) -> RemoteResult<Value> {
    let Some(object) = value.as_object() else {
        return Err(RemoteError::Decode(format!("typed value expected, got `{value}`")));
    };
    let Some((kind, inner)) = object.iter().next() else {
        return Err(RemoteError::Decode("empty typed value".to_string()));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| RemoteError::Decode(format!("booleanValue `{inner}`"))),
        "integerValue" => parse_integer(inner),
        "doubleValue" => Ok(inner.clone()),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "geoPointValue" => Ok(json!({
            "latitude": inner.get("latitude").cloned().unwrap_or(json!(0.0)),
            "longitude": inner.get("longitude").cloned().unwrap_or(json!(0.0)),
        })),
        "arrayValue" => {
            let values = match inner.get("values").and_then(Value::as_array) {
                Some(values) => values.iter().map(decode_value).collect::<RemoteResult<_>>()?,
                None => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Object(fields))
        }
        other => Err(RemoteError::Decode(format!("unsupported value type `{other}`"))),
    }
}

pub(crate) fn decode_fields(fields: &Map<String, Value>) -> RemoteResult<Fields> {
    fields
        .iter()
        .map(|(key, value)| decode_value(value).map(|decoded| (key.clone(), decoded)))
        .collect()
}

fn parse_integer(inner: &Value) -> RemoteResult<Value> {
    match inner {
        Value::String(text) => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|err| RemoteError::Decode(format!("integerValue `{text}`: {err}"))),
        Value::Number(_) => Ok(inner.clone()),
        other => Err(RemoteError::Decode(format!("integerValue `{other}`"))),
    }
}
