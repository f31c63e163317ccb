//! Account use cases: sign-in, sign-up and email verification.
//!
//! # Responsibility
//! - Drive the auth provider and keep the remote store's bearer token in sync
//!   with the current session.
//! - Create the role document (`users/{uid}`) and profile document at sign-up.
//!
//! # Invariants
//! - The current session is replaced only after the provider call succeeded.
//! - An unverified account stays signed in after `sign_in` fails with
//!   `EmailNotVerified`, so a verification email can be resent.
//! - A failed sign-in or sign-up leaves the store token of the current user
//!   (or none) installed.
//! - Passwords and tokens are never logged.

use super::{require_text, ServiceError, ServiceResult};
use crate::auth::{AuthProvider, AuthSession};
use crate::model::now_millis;
use crate::model::user::{NewProfile, UserAccount, UserRole, USERS_COLLECTION};
use crate::remote::{to_fields, DocumentStore};
use log::info;
use std::sync::{Arc, PoisonError, RwLock};

/// Session plus the role resolved from the `users` collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedInUser {
    pub session: AuthSession,
    pub role: UserRole,
}

impl SignedInUser {
    pub fn user_id(&self) -> &str {
        &self.session.user_id
    }

    pub fn email(&self) -> &str {
        &self.session.email
    }
}

pub struct AccountService<A: AuthProvider> {
    auth: A,
    store: Arc<dyn DocumentStore>,
    current: RwLock<Option<SignedInUser>>,
}

impl<A: AuthProvider> AccountService<A> {
    pub fn new(auth: A, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            auth,
            store,
            current: RwLock::new(None),
        }
    }

    /// Signs in and resolves the account role.
    pub async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<SignedInUser> {
        require_text("email", email)?;
        require_text("password", password)?;

        let session = self.auth.sign_in(email.trim(), password).await?;
        self.store.set_auth_token(Some(session.id_token.clone()));
        let (account, verified) = match self.resolve_account(&session).await {
            Ok(resolved) => resolved,
            Err(err) => {
                self.restore_auth_token();
                return Err(err);
            }
        };

        let user = SignedInUser {
            session,
            role: account.role,
        };
        self.replace_current(Some(user.clone()));
        info!(
            "event=sign_in module=account status={} role={}",
            if verified { "ok" } else { "unverified" },
            user.role.as_str()
        );
        if !verified {
            return Err(ServiceError::EmailNotVerified);
        }
        Ok(user)
    }

    /// Creates the auth account, role and profile documents, then sends the
    /// verification email. The new account stays signed in but unverified.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: NewProfile,
    ) -> ServiceResult<SignedInUser> {
        require_text("email", email)?;
        require_text("password", password)?;
        let role = profile.role();
        let name = match &profile {
            NewProfile::Volunteer(volunteer) => volunteer.name.as_str(),
            NewProfile::Shelter(shelter) => shelter.name.as_str(),
        };
        require_text("name", name)?;

        let email = email.trim();
        let session = self.auth.sign_up(email, password).await?;
        self.store.set_auth_token(Some(session.id_token.clone()));
        if let Err(err) = self.create_account(&session, email, profile).await {
            self.restore_auth_token();
            return Err(err);
        }

        let user = SignedInUser { session, role };
        self.replace_current(Some(user.clone()));
        info!(
            "event=sign_up module=account status=ok role={}",
            role.as_str()
        );
        Ok(user)
    }

    pub async fn resend_verification(&self) -> ServiceResult<()> {
        let user = self.require_session()?;
        self.auth
            .send_email_verification(&user.session.id_token)
            .await?;
        Ok(())
    }

    /// Whether the current account confirmed its email address.
    pub async fn check_verification(&self) -> ServiceResult<bool> {
        let user = self.require_session()?;
        Ok(self.auth.is_email_verified(&user.session.id_token).await?)
    }

    pub async fn send_password_reset(&self, email: &str) -> ServiceResult<()> {
        require_text("email", email)?;
        self.auth.send_password_reset(email.trim()).await?;
        Ok(())
    }

    pub fn sign_out(&self) {
        self.replace_current(None);
        info!("event=sign_out module=account status=ok");
    }

    pub fn current_user(&self) -> Option<SignedInUser> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current user or `NotSignedIn`.
    pub fn require_session(&self) -> ServiceResult<SignedInUser> {
        self.current_user().ok_or(ServiceError::NotSignedIn)
    }

    /// Role document and verification state of a freshly signed-in session.
    async fn resolve_account(&self, session: &AuthSession) -> ServiceResult<(UserAccount, bool)> {
        let account = self
            .store
            .get(USERS_COLLECTION, &session.user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("account role".to_string()))?
            .decode::<UserAccount>()?;
        let verified = self.auth.is_email_verified(&session.id_token).await?;
        Ok((account, verified))
    }

    async fn create_account(
        &self,
        session: &AuthSession,
        email: &str,
        profile: NewProfile,
    ) -> ServiceResult<()> {
        let uid = session.user_id.as_str();
        let role = profile.role();
        let account = UserAccount {
            id: uid.to_string(),
            email: email.to_string(),
            role,
            created_at: now_millis(),
        };
        self.store
            .set(USERS_COLLECTION, uid, to_fields(&account)?)
            .await?;

        let profile_fields = match profile {
            NewProfile::Volunteer(mut volunteer) => {
                volunteer.email = email.to_string();
                to_fields(&volunteer)?
            }
            NewProfile::Shelter(mut shelter) => {
                shelter.email = email.to_string();
                to_fields(&shelter)?
            }
        };
        self.store
            .set(role.profile_collection(), uid, profile_fields)
            .await?;

        self.auth.send_email_verification(&session.id_token).await?;
        Ok(())
    }

    /// Puts the current user's token back after a failed session switch.
    fn restore_auth_token(&self) {
        self.store
            .set_auth_token(self.current_user().map(|user| user.session.id_token));
    }

    fn replace_current(&self, user: Option<SignedInUser>) {
        self.store
            .set_auth_token(user.as_ref().map(|user| user.session.id_token.clone()));
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = user;
    }
}
