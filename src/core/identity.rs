//! Identity and profile abstractions

use super::error::IdentityError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated session handle. It is obtained once at sign-in and
/// passed explicitly to everything that acts on behalf of the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub id_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// The per-user record kept in the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_account(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    /// Replaces the password of the account behind `session`. Providers may
    /// refuse sessions that were not recently authenticated.
    async fn update_password(
        &self,
        session: &Session,
        new_password: &str,
    ) -> Result<Session, IdentityError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn create_profile(
        &self,
        session: &Session,
        profile: &UserProfile,
    ) -> Result<(), IdentityError>;

    /// `Ok(None)` when no record exists for the user.
    async fn fetch_profile(&self, session: &Session) -> Result<Option<UserProfile>, IdentityError>;

    /// Updates only the name fields of an existing record.
    async fn update_name(
        &self,
        session: &Session,
        first_name: &str,
        last_name: &str,
    ) -> Result<(), IdentityError>;
}
