//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate remote store, auth, upload and cache calls into use-case APIs.
//! - Classify every failure into `ServiceError` so callers can map it to a
//!   user-facing message through `HasMessage`.
//!
//! # Invariants
//! - Services never retry; one failed port call fails the whole use case.

use crate::auth::AuthError;
use crate::error::{HasMessage, MessageId};
use crate::model::pet::PetValidationError;
use crate::remote::RemoteError;
use crate::repo::chat_repo::RepoError;
use crate::upload::UploadError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod account_service;
pub mod chat_service;
pub mod contact;
pub mod favorite_service;
pub mod pet_service;
pub mod post_service;
pub mod profile_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Use-case level error.
#[derive(Debug)]
pub enum ServiceError {
    Remote(RemoteError),
    Auth(AuthError),
    Upload(UploadError),
    Repo(RepoError),
    InvalidPet(PetValidationError),
    /// Caller input rejected before any remote call.
    InvalidInput(String),
    /// Use case requires a signed-in user.
    NotSignedIn,
    EmailNotVerified,
    /// Signed-in user does not own the target record.
    NotOwner(String),
    NotFound(String),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(err) => write!(f, "{err}"),
            Self::Auth(err) => write!(f, "{err}"),
            Self::Upload(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InvalidPet(err) => write!(f, "{err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::NotSignedIn => write!(f, "no signed-in user"),
            Self::EmailNotVerified => write!(f, "email address is not verified"),
            Self::NotOwner(what) => write!(f, "not the owner of {what}"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Remote(err) => Some(err),
            Self::Auth(err) => Some(err),
            Self::Upload(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::InvalidPet(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RemoteError> for ServiceError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

impl From<AuthError> for ServiceError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<UploadError> for ServiceError {
    fn from(value: UploadError) -> Self {
        Self::Upload(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<PetValidationError> for ServiceError {
    fn from(value: PetValidationError) -> Self {
        Self::InvalidPet(value)
    }
}

impl HasMessage for ServiceError {
    fn message_id(&self) -> MessageId {
        match self {
            Self::Remote(err) => err.message_id(),
            Self::Auth(err) => err.message_id(),
            Self::Upload(err) => err.message_id(),
            Self::Repo(err) => err.message_id(),
            Self::InvalidPet(_) | Self::InvalidInput(_) => MessageId::InvalidInput,
            Self::NotSignedIn => MessageId::NotSignedIn,
            Self::EmailNotVerified => MessageId::EmailNotVerified,
            Self::NotOwner(_) => MessageId::PermissionDenied,
            Self::NotFound(_) => MessageId::NotFound,
        }
    }
}

/// Rejects blank required text input.
pub(crate) fn require_text(name: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidInput(format!("{name} cannot be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ServiceError;
    use crate::error::{HasMessage, MessageId};
    use crate::remote::RemoteError;

    #[test]
    fn transport_failures_surface_as_no_connection() {
        let err = ServiceError::from(RemoteError::Transport("dns".into()));
        assert_eq!(err.message_id(), MessageId::NoConnection);
        assert_eq!(err.user_message(), "Please check your internet connection.");
    }

    #[test]
    fn ownership_violation_maps_to_permission_denied() {
        let err = ServiceError::NotOwner("post p1".into());
        assert_eq!(err.message_id(), MessageId::PermissionDenied);
    }
}
