//! Remote authentication contract.
//!
//! # Responsibility
//! - Define sign-in/sign-up/verification operations against the auth provider.
//! - Classify provider failures into typed `AuthError` variants.
//!
//! # Invariants
//! - `AuthSession::id_token` is never logged.

use crate::error::{HasMessage, MessageId};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod firebase;

pub use firebase::FirebaseAuth;

pub type AuthResult<T> = Result<T, AuthError>;

/// Signed-in user as returned by the auth provider.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("user_id", &self.user_id)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    InvalidCredentials,
    EmailAlreadyInUse,
    InvalidEmail,
    WeakPassword(String),
    UserNotFound,
    UserDisabled,
    TooManyAttempts,
    /// Token expired or revoked; the user must sign in again.
    SessionExpired,
    Transport(String),
    Provider { code: String },
}

impl AuthError {
    /// Maps an Identity Toolkit error code (`EMAIL_EXISTS`, …) to a variant.
    pub fn from_provider_code(raw: &str) -> Self {
        // Codes may carry a detail suffix: "WEAK_PASSWORD : Password should be…".
        let (code, detail) = match raw.split_once(':') {
            Some((code, detail)) => (code.trim(), detail.trim()),
            None => (raw.trim(), ""),
        };
        match code {
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_CREDENTIAL" => {
                Self::InvalidCredentials
            }
            "EMAIL_EXISTS" => Self::EmailAlreadyInUse,
            "INVALID_EMAIL" | "MISSING_EMAIL" => Self::InvalidEmail,
            "WEAK_PASSWORD" | "MISSING_PASSWORD" => Self::WeakPassword(detail.to_string()),
            "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => Self::UserNotFound,
            "USER_DISABLED" => Self::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_TOKEN_EXPIRED" => Self::SessionExpired,
            other => Self::Provider {
                code: other.to_string(),
            },
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid email or password"),
            Self::EmailAlreadyInUse => write!(f, "email already in use"),
            Self::InvalidEmail => write!(f, "invalid email address"),
            Self::WeakPassword(detail) if detail.is_empty() => write!(f, "password is too weak"),
            Self::WeakPassword(detail) => write!(f, "password is too weak: {detail}"),
            Self::UserNotFound => write!(f, "user not found"),
            Self::UserDisabled => write!(f, "user disabled"),
            Self::TooManyAttempts => write!(f, "too many attempts"),
            Self::SessionExpired => write!(f, "session expired"),
            Self::Transport(message) => write!(f, "auth request failed: {message}"),
            Self::Provider { code } => write!(f, "auth provider error: {code}"),
        }
    }
}

impl Error for AuthError {}

impl HasMessage for AuthError {
    fn message_id(&self) -> MessageId {
        match self {
            Self::InvalidCredentials => MessageId::InvalidCredentials,
            Self::EmailAlreadyInUse => MessageId::EmailAlreadyInUse,
            Self::InvalidEmail => MessageId::InvalidEmail,
            Self::WeakPassword(_) => MessageId::WeakPassword,
            Self::UserNotFound => MessageId::UserNotFound,
            Self::UserDisabled => MessageId::UserDisabled,
            Self::TooManyAttempts => MessageId::TooManyAttempts,
            Self::SessionExpired => MessageId::NotSignedIn,
            Self::Transport(_) => MessageId::NoConnection,
            Self::Provider { .. } => MessageId::Unknown,
        }
    }
}

/// Remote authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession>;
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<AuthSession>;
    async fn send_email_verification(&self, id_token: &str) -> AuthResult<()>;
    async fn is_email_verified(&self, id_token: &str) -> AuthResult<bool>;
    async fn send_password_reset(&self, email: &str) -> AuthResult<()>;
}

#[async_trait]
impl<T: AuthProvider + ?Sized> AuthProvider for Arc<T> {
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        (**self).sign_in(email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        (**self).sign_up(email, password).await
    }

    async fn send_email_verification(&self, id_token: &str) -> AuthResult<()> {
        (**self).send_email_verification(id_token).await
    }

    async fn is_email_verified(&self, id_token: &str) -> AuthResult<bool> {
        (**self).is_email_verified(id_token).await
    }

    async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        (**self).send_password_reset(email).await
    }
}

#[cfg(test)]
mod tests {
    use super::AuthError;
    use crate::error::{HasMessage, MessageId};

    #[test]
    fn provider_codes_map_to_variants() {
        assert_eq!(
            AuthError::from_provider_code("INVALID_LOGIN_CREDENTIALS"),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            AuthError::from_provider_code("WEAK_PASSWORD : Password should be at least 6 characters"),
            AuthError::WeakPassword("Password should be at least 6 characters".to_string())
        );
        assert_eq!(
            AuthError::from_provider_code("OPERATION_NOT_ALLOWED"),
            AuthError::Provider {
                code: "OPERATION_NOT_ALLOWED".to_string()
            }
        );
    }

    #[test]
    fn transport_failures_ask_to_check_connection() {
        let err = AuthError::Transport("dns".to_string());
        assert_eq!(err.message_id(), MessageId::NoConnection);
    }
}
