//! User-facing message identifiers for failed operations.
//!
//! # Responsibility
//! - Define the closed set of localized message keys the UI can display.
//! - Let every public error type name the message it should surface as.
//!
//! # Invariants
//! - Keys are stable; the UI resolves them to localized strings.
//! - Connectivity failures always map to `MessageId::NoConnection`.

use std::fmt::{Display, Formatter};

/// Localized message identifier surfaced by `Resource::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageId {
    NoConnection,
    InvalidCredentials,
    EmailAlreadyInUse,
    InvalidEmail,
    WeakPassword,
    UserNotFound,
    UserDisabled,
    TooManyAttempts,
    EmailNotVerified,
    NotSignedIn,
    PermissionDenied,
    NotFound,
    InvalidInput,
    UploadFailed,
    LocalStorage,
    Unknown,
}

impl MessageId {
    /// Stable resource key resolved by the UI layer.
    pub fn key(self) -> &'static str {
        match self {
            Self::NoConnection => "error_no_connection",
            Self::InvalidCredentials => "error_invalid_credentials",
            Self::EmailAlreadyInUse => "error_email_already_in_use",
            Self::InvalidEmail => "error_invalid_email",
            Self::WeakPassword => "error_weak_password",
            Self::UserNotFound => "error_user_not_found",
            Self::UserDisabled => "error_user_disabled",
            Self::TooManyAttempts => "error_too_many_attempts",
            Self::EmailNotVerified => "error_email_not_verified",
            Self::NotSignedIn => "error_not_signed_in",
            Self::PermissionDenied => "error_permission_denied",
            Self::NotFound => "error_not_found",
            Self::InvalidInput => "error_invalid_input",
            Self::UploadFailed => "error_upload_failed",
            Self::LocalStorage => "error_local_storage",
            Self::Unknown => "error_unknown",
        }
    }

    /// English fallback used when no localized string is available.
    pub fn default_text(self) -> &'static str {
        match self {
            Self::NoConnection => "Please check your internet connection.",
            Self::InvalidCredentials => "The email or password is incorrect.",
            Self::EmailAlreadyInUse => "An account with this email already exists.",
            Self::InvalidEmail => "The email address is badly formatted.",
            Self::WeakPassword => "The password must be at least 6 characters.",
            Self::UserNotFound => "No account found for this email.",
            Self::UserDisabled => "This account has been disabled.",
            Self::TooManyAttempts => "Too many attempts. Try again later.",
            Self::EmailNotVerified => "Please verify your email address first.",
            Self::NotSignedIn => "Please sign in to continue.",
            Self::PermissionDenied => "You do not have permission to do this.",
            Self::NotFound => "The requested item no longer exists.",
            Self::InvalidInput => "Some of the entered information is invalid.",
            Self::UploadFailed => "The image could not be uploaded.",
            Self::LocalStorage => "Local data could not be read or saved.",
            Self::Unknown => "Something went wrong.",
        }
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Errors that know which user-facing message they map to.
pub trait HasMessage {
    fn message_id(&self) -> MessageId;

    /// Text placed into `Resource::Error`.
    fn user_message(&self) -> String {
        self.message_id().default_text().to_string()
    }
}
