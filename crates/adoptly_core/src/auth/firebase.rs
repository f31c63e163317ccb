//! Identity Toolkit REST client (`accounts:*` endpoints).

use super::{AuthError, AuthProvider, AuthResult, AuthSession};
use crate::config::FirebaseConfig;
use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

pub struct FirebaseAuth {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    #[serde(default)]
    email_verified: bool,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

impl FirebaseAuth {
    pub fn new(config: &FirebaseConfig) -> AuthResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| AuthError::Transport(err.to_string()))?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: Client, config: &FirebaseConfig) -> Self {
        Self {
            http,
            base_url: config.auth_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    async fn call(&self, endpoint: &str, body: Value) -> AuthResult<Value> {
        let url = format!("{}/v1/accounts:{endpoint}", self.base_url);
        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!("event=auth_request module=auth status=error endpoint={endpoint} error_code=transport");
                AuthError::Transport(err.to_string())
            })?;

        let status = response.status();
        let payload: Value = response.json().await.map_err(|_| {
            warn!(
                "event=auth_request module=auth status=error endpoint={endpoint} http_status={} error_code=malformed_body",
                status.as_u16()
            );
            AuthError::Provider {
                code: format!("HTTP_{}", status.as_u16()),
            }
        })?;

        if status.is_success() {
            return Ok(payload);
        }

        let code = payload
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN");
        let error = AuthError::from_provider_code(code);
        warn!(
            "event=auth_request module=auth status=error endpoint={endpoint} http_status={} error_code={}",
            status.as_u16(),
            code.split(':').next().unwrap_or(code).trim()
        );
        Err(error)
    }

    async fn token_call(&self, endpoint: &str, email: &str, password: &str) -> AuthResult<AuthSession> {
        let payload = self
            .call(
                endpoint,
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        let token: TokenResponse = serde_json::from_value(payload)
            .map_err(|err| AuthError::Provider {
                code: format!("MALFORMED_RESPONSE: {err}"),
            })?;
        info!("event=auth_request module=auth status=ok endpoint={endpoint}");
        Ok(AuthSession {
            user_id: token.local_id,
            email: if token.email.is_empty() {
                email.to_string()
            } else {
                token.email
            },
            id_token: token.id_token,
            refresh_token: token.refresh_token,
            expires_in: token
                .expires_in
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(3600),
        })
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.token_call("signInWithPassword", email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.token_call("signUp", email, password).await
    }

    async fn send_email_verification(&self, id_token: &str) -> AuthResult<()> {
        self.call(
            "sendOobCode",
            json!({ "requestType": "VERIFY_EMAIL", "idToken": id_token }),
        )
        .await
        .map(|_| ())
    }

    async fn is_email_verified(&self, id_token: &str) -> AuthResult<bool> {
        let payload = self.call("lookup", json!({ "idToken": id_token })).await?;
        let lookup: LookupResponse =
            serde_json::from_value(payload).map_err(|err| AuthError::Provider {
                code: format!("MALFORMED_RESPONSE: {err}"),
            })?;
        lookup
            .users
            .first()
            .map(|user| user.email_verified)
            .ok_or(AuthError::UserNotFound)
    }

    async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        self.call(
            "sendOobCode",
            json!({ "requestType": "PASSWORD_RESET", "email": email }),
        )
        .await
        .map(|_| ())
    }
}
