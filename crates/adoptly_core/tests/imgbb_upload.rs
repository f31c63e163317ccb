use adoptly_core::config::ImageHostConfig;
use adoptly_core::{HasMessage, ImageHost, ImageUpload, ImgBbClient, MessageId, UploadError};
use httpmock::prelude::*;
use serde_json::json;

fn client(server: &MockServer, api_key: &str) -> ImgBbClient {
    ImgBbClient::new(&ImageHostConfig {
        api_key: api_key.to_string(),
        base_url: server.base_url(),
    })
    .unwrap()
}

#[tokio::test]
async fn upload_posts_multipart_image_and_returns_urls() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/1/upload")
                .query_param("key", "img-key")
                .body_contains("name=\"image\"")
                .body_contains("filename=\"luna.jpg\"");
            then.status(200).json_body(json!({
                "data": {
                    "id": "2ndCYJK",
                    "url": "https://i.ibb.co/w04Prt6/luna.jpg",
                    "delete_url": "https://ibb.co/2ndCYJK/670a7e48ddcb85ac340c717a41047e5c"
                },
                "success": true,
                "status": 200
            }));
        })
        .await;

    let hosted = client(&server, "img-key")
        .upload(&ImageUpload::new("luna.jpg", b"jpeg-bytes".to_vec()))
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(hosted.url, "https://i.ibb.co/w04Prt6/luna.jpg");
    assert!(hosted.delete_url.is_some());
}

#[tokio::test]
async fn rejected_upload_carries_host_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/1/upload");
            then.status(400).json_body(json!({
                "status_code": 400,
                "error": { "message": "Invalid API v1 key.", "code": 100 },
                "status_txt": "Bad Request"
            }));
        })
        .await;

    let err = client(&server, "bad-key")
        .upload(&ImageUpload::new("a.png", vec![1, 2, 3]))
        .await
        .unwrap_err();
    match &err {
        UploadError::Rejected { status, message } => {
            assert_eq!(*status, 400);
            assert_eq!(message, "Invalid API v1 key.");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.message_id(), MessageId::UploadFailed);
}

#[tokio::test]
async fn empty_payload_and_missing_key_fail_before_any_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.path("/1/upload");
            then.status(500);
        })
        .await;

    let err = client(&server, "img-key")
        .upload(&ImageUpload::new("a.png", Vec::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::EmptyImage));

    let err = client(&server, " ")
        .upload(&ImageUpload::new("a.png", vec![1]))
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::MissingApiKey));
    mock.assert_hits_async(0).await;
}
