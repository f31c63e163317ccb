use adoptly_core::config::FirebaseConfig;
use adoptly_core::remote::{Direction, Fields, PageCursor, Query, RemoteError};
use adoptly_core::{DocumentStore, FirestoreStore, HasMessage, MessageId, Pet, Species};
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::json;

const DOCS: &str = "/v1/projects/demo/databases/(default)/documents";

fn store(server: &MockServer) -> FirestoreStore {
    let mut config = FirebaseConfig::new("demo", "web-key");
    config.firestore_base_url = server.base_url();
    FirestoreStore::new(&config).unwrap()
}

fn fields(value: serde_json::Value) -> Fields {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn get_decodes_typed_fields_into_model() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{DOCS}/pets/p1"));
            then.status(200).json_body(json!({
                "name": "projects/demo/databases/(default)/documents/pets/p1",
                "fields": {
                    "ownerId": { "stringValue": "vol-1" },
                    "name": { "stringValue": "Luna" },
                    "species": { "stringValue": "cat" },
                    "ageMonths": { "integerValue": "14" },
                    "images": { "arrayValue": { "values": [{ "stringValue": "https://img/1.jpg" }] } },
                    "location": { "geoPointValue": { "latitude": 30.04, "longitude": 31.23 } },
                    "vaccinated": { "booleanValue": true },
                    "createdAt": { "integerValue": "1700000000000" }
                }
            }));
        })
        .await;

    let doc = store(&server).get("pets", "p1").await.unwrap().unwrap();
    mock.assert_async().await;

    let pet: Pet = doc.decode().unwrap();
    assert_eq!(pet.id, "p1");
    assert_eq!(pet.species, Species::Cat);
    assert_eq!(pet.age_months, Some(14));
    assert_eq!(pet.cover_image(), Some("https://img/1.jpg"));
    assert!(pet.vaccinated);
    assert_eq!(pet.location.unwrap().latitude, 30.04);
    assert_eq!(pet.created_at, 1_700_000_000_000);
}

#[tokio::test]
async fn missing_document_reads_as_none_and_delete_succeeds() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.path(format!("{DOCS}/pets/gone"));
            then.status(404)
                .json_body(json!({ "error": { "code": 404, "message": "not found" } }));
        })
        .await;

    let store = store(&server);
    assert!(store.get("pets", "gone").await.unwrap().is_none());
    store.delete("pets", "gone").await.unwrap();
}

#[tokio::test]
async fn update_sends_field_mask_and_maps_missing_document() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path(format!("{DOCS}/pets/p1"))
                .query_param("updateMask.fieldPaths", "adopted")
                .query_param("currentDocument.exists", "true")
                .json_body(json!({ "fields": { "adopted": { "booleanValue": true } } }));
            then.status(404)
                .json_body(json!({ "error": { "code": 404, "message": "No document to update" } }));
        })
        .await;

    let err = store(&server)
        .update("pets", "p1", fields(json!({ "adopted": true })))
        .await
        .unwrap_err();
    mock.assert_async().await;
    assert!(matches!(err, RemoteError::NotFound { .. }));
}

#[tokio::test]
async fn query_sends_structured_query_with_cursor_and_bearer_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{DOCS}:runQuery"))
                .header("authorization", "Bearer id-token-1")
                .json_body(json!({
                    "structuredQuery": {
                        "from": [{ "collectionId": "pets" }],
                        "where": {
                            "fieldFilter": {
                                "field": { "fieldPath": "adopted" },
                                "op": "EQUAL",
                                "value": { "booleanValue": false }
                            }
                        },
                        "orderBy": [
                            { "field": { "fieldPath": "createdAt" }, "direction": "DESCENDING" },
                            { "field": { "fieldPath": "__name__" }, "direction": "DESCENDING" }
                        ],
                        "startAt": {
                            "values": [
                                { "integerValue": "50" },
                                { "referenceValue": "projects/demo/databases/(default)/documents/pets/p9" }
                            ],
                            "before": false
                        },
                        "limit": 2
                    }
                }));
            then.status(200).json_body(json!([
                {
                    "document": {
                        "name": "projects/demo/databases/(default)/documents/pets/p8",
                        "fields": { "createdAt": { "integerValue": "40" } }
                    },
                    "readTime": "2024-01-01T00:00:00Z"
                },
                { "readTime": "2024-01-01T00:00:00Z" }
            ]));
        })
        .await;

    let store = store(&server);
    store.set_auth_token(Some("id-token-1".to_string()));
    let query = Query::collection("pets")
        .where_eq("adopted", false)
        .order_by("createdAt", Direction::Descending)
        .limit(2)
        .start_after(Some(PageCursor {
            values: vec![json!(50)],
            document_id: "p9".to_string(),
        }));

    let docs = store.query(&query).await.unwrap();
    mock.assert_async().await;
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "p8");
    assert_eq!(docs[0].get("createdAt"), Some(&json!(40)));
}

#[tokio::test]
async fn count_reads_aggregation_alias() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{DOCS}:runAggregationQuery"))
                .json_body_partial(
                    r#"{"structuredAggregationQuery":{"aggregations":[{"alias":"total","count":{}}]}}"#,
                );
            then.status(200).json_body(json!([
                { "result": { "aggregateFields": { "total": { "integerValue": "3" } } } }
            ]));
        })
        .await;

    let query = Query::collection("views").where_eq("petId", "p1");
    assert_eq!(store(&server).count(&query).await.unwrap(), 3);
}

#[tokio::test]
async fn add_returns_generated_id() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(format!("{DOCS}/posts"));
            then.status(200).json_body(json!({
                "name": "projects/demo/databases/(default)/documents/posts/AbC123",
                "fields": {}
            }));
        })
        .await;

    let id = store(&server)
        .add("posts", fields(json!({ "content": "hi" })))
        .await
        .unwrap();
    assert_eq!(id, "AbC123");
}

#[tokio::test]
async fn forbidden_maps_to_permission_denied() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PATCH).path(format!("{DOCS}/users/u1"));
            then.status(403).json_body(json!({
                "error": { "code": 403, "message": "Missing or insufficient permissions." }
            }));
        })
        .await;

    let err = store(&server)
        .set("users", "u1", fields(json!({ "role": "shelter" })))
        .await
        .unwrap_err();
    assert_eq!(err.message_id(), MessageId::PermissionDenied);
    assert!(err.to_string().contains("insufficient permissions"));
}

#[tokio::test]
async fn unreachable_server_is_a_connection_error() {
    let mut config = FirebaseConfig::new("demo", "web-key");
    config.firestore_base_url = "http://127.0.0.1:9".to_string();
    let store = FirestoreStore::new(&config).unwrap();

    let err = store.get("pets", "p1").await.unwrap_err();
    assert!(matches!(err, RemoteError::Transport(_)));
    assert_eq!(err.message_id(), MessageId::NoConnection);
}
