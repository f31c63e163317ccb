use adoptly_core::config::FirebaseConfig;
use adoptly_core::{AuthError, AuthProvider, FirebaseAuth, HasMessage, MessageId};
use httpmock::prelude::*;
use serde_json::json;

fn auth(server: &MockServer) -> FirebaseAuth {
    let mut config = FirebaseConfig::new("demo", "web-key");
    config.auth_base_url = server.base_url();
    FirebaseAuth::new(&config).unwrap()
}

fn provider_error(code: &str) -> serde_json::Value {
    json!({ "error": { "code": 400, "message": code, "errors": [] } })
}

#[tokio::test]
async fn sign_in_returns_session_from_token_response() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/accounts:signInWithPassword")
                .query_param("key", "web-key")
                .json_body(json!({
                    "email": "mona@example.org",
                    "password": "secret123",
                    "returnSecureToken": true
                }));
            then.status(200).json_body(json!({
                "localId": "uid-1",
                "email": "mona@example.org",
                "idToken": "id-token",
                "refreshToken": "refresh-token",
                "expiresIn": "3600",
                "registered": true
            }));
        })
        .await;

    let session = auth(&server)
        .sign_in("mona@example.org", "secret123")
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(session.user_id, "uid-1");
    assert_eq!(session.id_token, "id-token");
    assert_eq!(session.expires_in, 3600);
    assert!(!format!("{session:?}").contains("id-token"));
}

#[tokio::test]
async fn provider_codes_map_to_typed_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.path("/v1/accounts:signInWithPassword");
            then.status(400)
                .json_body(provider_error("INVALID_LOGIN_CREDENTIALS"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.path("/v1/accounts:signUp");
            then.status(400).json_body(provider_error(
                "WEAK_PASSWORD : Password should be at least 6 characters",
            ));
        })
        .await;

    let client = auth(&server);
    let err = client.sign_in("a@example.org", "nope").await.unwrap_err();
    assert_eq!(err, AuthError::InvalidCredentials);
    assert_eq!(err.message_id(), MessageId::InvalidCredentials);

    let err = client.sign_up("a@example.org", "123").await.unwrap_err();
    assert_eq!(
        err,
        AuthError::WeakPassword("Password should be at least 6 characters".to_string())
    );
}

#[tokio::test]
async fn verification_and_reset_use_oob_codes() {
    let server = MockServer::start_async().await;
    let verify = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/accounts:sendOobCode")
                .json_body(json!({ "requestType": "VERIFY_EMAIL", "idToken": "tok" }));
            then.status(200).json_body(json!({ "email": "a@example.org" }));
        })
        .await;
    let reset = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/accounts:sendOobCode")
                .json_body(json!({ "requestType": "PASSWORD_RESET", "email": "a@example.org" }));
            then.status(200).json_body(json!({ "email": "a@example.org" }));
        })
        .await;

    let client = auth(&server);
    client.send_email_verification("tok").await.unwrap();
    client.send_password_reset("a@example.org").await.unwrap();
    verify.assert_async().await;
    reset.assert_async().await;
}

#[tokio::test]
async fn lookup_reports_email_verification_state() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.path("/v1/accounts:lookup")
                .json_body(json!({ "idToken": "verified" }));
            then.status(200)
                .json_body(json!({ "users": [{ "localId": "u1", "emailVerified": true }] }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.path("/v1/accounts:lookup")
                .json_body(json!({ "idToken": "expired" }));
            then.status(400).json_body(provider_error("INVALID_ID_TOKEN"));
        })
        .await;

    let client = auth(&server);
    assert!(client.is_email_verified("verified").await.unwrap());
    let err = client.is_email_verified("expired").await.unwrap_err();
    assert_eq!(err, AuthError::SessionExpired);
    assert_eq!(err.message_id(), MessageId::NotSignedIn);
}

#[tokio::test]
async fn non_json_reply_is_a_provider_error_not_a_connection_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.path("/v1/accounts:signInWithPassword");
            then.status(502)
                .header("content-type", "text/html")
                .body("<html><body>Bad Gateway</body></html>");
        })
        .await;

    let err = auth(&server)
        .sign_in("a@example.org", "secret123")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AuthError::Provider {
            code: "HTTP_502".to_string()
        }
    );
    assert_ne!(err.message_id(), MessageId::NoConnection);
}
