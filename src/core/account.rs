//! Account workflows on top of an identity provider and a profile store.
use crate::core::error::IdentityError;
use crate::core::identity::{IdentityProvider, ProfileStore, Session, UserProfile};
use chrono::Utc;
use tracing::{debug, info};

pub const MIN_PASSWORD_LEN: usize = 6;

pub struct AccountService<'a> {
    identity: &'a (dyn IdentityProvider + Send + Sync),
    profiles: &'a (dyn ProfileStore + Send + Sync),
}

impl<'a> AccountService<'a> {
    pub fn new(
        identity: &'a (dyn IdentityProvider + Send + Sync),
        profiles: &'a (dyn ProfileStore + Send + Sync),
    ) -> Self {
        AccountService { identity, profiles }
    }

    /// Creates the account and its profile record.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<(Session, UserProfile), IdentityError> {
        let session = self.identity.create_account(email, password).await?;
        let profile = UserProfile {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email: session.email.clone(),
            created_at: Some(Utc::now()),
        };
        self.profiles.create_profile(&session, &profile).await?;
        info!(uid = %session.uid, "Registered new account");
        Ok((session, profile))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let session = self.identity.sign_in(email, password).await?;
        info!(uid = %session.uid, "Signed in");
        Ok(session)
    }

    pub async fn profile(&self, session: &Session) -> Result<Option<UserProfile>, IdentityError> {
        self.profiles.fetch_profile(session).await
    }

    pub async fn update_profile(
        &self,
        session: &Session,
        first_name: &str,
        last_name: &str,
    ) -> Result<(), IdentityError> {
        self.profiles
            .update_name(session, first_name.trim(), last_name.trim())
            .await
    }

    /// Validates the new password, re-authenticates with the current one and
    /// only then changes it. Returns the refreshed session.
    pub async fn change_password(
        &self,
        session: &Session,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<Session, IdentityError> {
        if new_password != confirm_password {
            return Err(IdentityError::PasswordMismatch);
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::PasswordTooShort);
        }

        let fresh = match self.identity.sign_in(&session.email, current_password).await {
            Ok(fresh) => fresh,
            Err(IdentityError::InvalidCredentials) => {
                debug!(uid = %session.uid, "Re-authentication rejected");
                return Err(IdentityError::WrongCurrentPassword);
            }
            Err(e) => return Err(e),
        };

        let updated = self.identity.update_password(&fresh, new_password).await?;
        info!(uid = %updated.uid, "Password changed");
        Ok(updated)
    }
}
