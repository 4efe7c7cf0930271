//! Firebase Identity Toolkit and Cloud Firestore REST adapters.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::core::config::FirebaseProviderConfig;
use crate::core::error::IdentityError;
use crate::core::identity::{IdentityProvider, ProfileStore, Session, UserProfile};

fn http_client(config: &FirebaseProviderConfig) -> Result<reqwest::Client, IdentityError> {
    Ok(reqwest::Client::builder()
        .user_agent("nomisma/0.1")
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .build()?)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Maps an Identity Toolkit error code onto the user-facing taxonomy.
fn identity_error(message: &str) -> IdentityError {
    match message {
        "EMAIL_EXISTS" => IdentityError::EmailExists,
        "EMAIL_NOT_FOUND" => IdentityError::UserNotFound,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => IdentityError::InvalidCredentials,
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => {
            IdentityError::SessionExpired
        }
        m if m.starts_with("WEAK_PASSWORD") => IdentityError::WeakPassword(
            m.split_once(" : ")
                .map_or("password is too weak", |(_, detail)| detail)
                .to_string(),
        ),
        other => IdentityError::Rejected(other.to_string()),
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorEnvelope>(&text) {
        Ok(envelope) => envelope.error.message,
        Err(_) => format!("HTTP {status}"),
    }
}

/// Credential auth against the Identity Toolkit `accounts:*` endpoints.
pub struct FirebaseAuthProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    #[serde(default)]
    local_id: String,
    email: Option<String>,
    id_token: String,
    expires_in: Option<String>,
}

impl FirebaseAuthProvider {
    pub fn new(config: &FirebaseProviderConfig) -> Result<Self, IdentityError> {
        Ok(FirebaseAuthProvider {
            base_url: config.auth_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client: http_client(config)?,
        })
    }

    async fn call(&self, action: &str, body: Value, fallback_email: &str) -> Result<Session, IdentityError> {
        let url = format!("{}/v1/accounts:{}?key={}", self.base_url, action, self.api_key);
        debug!("Calling identity endpoint accounts:{}", action);

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let message = error_message(response).await;
            debug!(action, message = %message, "Identity request rejected");
            return Err(identity_error(&message));
        }

        let auth: AuthResponse = response.json().await?;
        let lifetime = auth
            .expires_in
            .as_deref()
            .and_then(|secs| secs.parse::<i64>().ok())
            .unwrap_or(3600);
        Ok(Session {
            uid: auth.local_id,
            email: auth.email.unwrap_or_else(|| fallback_email.to_string()),
            id_token: auth.id_token,
            expires_at: Utc::now() + Duration::seconds(lifetime),
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthProvider {
    #[instrument(name = "FirebaseSignUp", skip(self, password))]
    async fn create_account(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let body = json!({ "email": email, "password": password, "returnSecureToken": true });
        self.call("signUp", body, email).await
    }

    #[instrument(name = "FirebaseSignIn", skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let body = json!({ "email": email, "password": password, "returnSecureToken": true });
        self.call("signInWithPassword", body, email).await
    }

    #[instrument(name = "FirebaseUpdatePassword", skip_all, fields(uid = %session.uid))]
    async fn update_password(
        &self,
        session: &Session,
        new_password: &str,
    ) -> Result<Session, IdentityError> {
        let body = json!({
            "idToken": session.id_token,
            "password": new_password,
            "returnSecureToken": true,
        });
        let mut updated = self.call("update", body, &session.email).await?;
        // accounts:update does not echo the uid.
        if updated.uid.is_empty() {
            updated.uid = session.uid.clone();
        }
        Ok(updated)
    }
}

/// Profile records stored as `users/{uid}` Firestore documents.
pub struct FirestoreProfileStore {
    documents_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum FieldValue {
    StringValue(String),
    TimestampValue(DateTime<Utc>),
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    fields: HashMap<String, Value>,
}

impl Document {
    fn field(&self, name: &str, kind: &str) -> Option<&str> {
        self.fields.get(name)?.get(kind)?.as_str()
    }

    fn string(&self, name: &str) -> String {
        self.field(name, "stringValue").unwrap_or_default().to_string()
    }

    fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.field(name, "timestampValue")?.parse().ok()
    }
}

impl From<Document> for UserProfile {
    fn from(doc: Document) -> Self {
        UserProfile {
            first_name: doc.string("firstName"),
            last_name: doc.string("lastName"),
            email: doc.string("email"),
            created_at: doc.timestamp("createdAt"),
        }
    }
}

impl FirestoreProfileStore {
    pub fn new(config: &FirebaseProviderConfig) -> Result<Self, IdentityError> {
        Ok(FirestoreProfileStore {
            documents_url: format!(
                "{}/v1/projects/{}/databases/(default)/documents",
                config.firestore_base_url.trim_end_matches('/'),
                config.project_id
            ),
            client: http_client(config)?,
        })
    }

    fn user_url(&self, session: &Session) -> String {
        format!("{}/users/{}", self.documents_url, session.uid)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, IdentityError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = error_message(response).await;
        Err(match status.as_u16() {
            401 => IdentityError::SessionExpired,
            _ => IdentityError::Document(message),
        })
    }
}

#[async_trait]
impl ProfileStore for FirestoreProfileStore {
    #[instrument(name = "FirestoreCreateProfile", skip_all, fields(uid = %session.uid))]
    async fn create_profile(
        &self,
        session: &Session,
        profile: &UserProfile,
    ) -> Result<(), IdentityError> {
        let mut fields = serde_json::Map::new();
        fields.insert("firstName".into(), json!(FieldValue::StringValue(profile.first_name.clone())));
        fields.insert("lastName".into(), json!(FieldValue::StringValue(profile.last_name.clone())));
        fields.insert("email".into(), json!(FieldValue::StringValue(profile.email.clone())));
        if let Some(created_at) = profile.created_at {
            fields.insert("createdAt".into(), json!(FieldValue::TimestampValue(created_at)));
        }

        let response = self
            .client
            .patch(self.user_url(session))
            .bearer_auth(&session.id_token)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    #[instrument(name = "FirestoreFetchProfile", skip_all, fields(uid = %session.uid))]
    async fn fetch_profile(&self, session: &Session) -> Result<Option<UserProfile>, IdentityError> {
        let response = self
            .client
            .get(self.user_url(session))
            .bearer_auth(&session.id_token)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("No profile document for user");
            return Ok(None);
        }
        let document: Document = Self::check(response).await?.json().await?;
        Ok(Some(document.into()))
    }

    #[instrument(name = "FirestoreUpdateName", skip_all, fields(uid = %session.uid))]
    async fn update_name(
        &self,
        session: &Session,
        first_name: &str,
        last_name: &str,
    ) -> Result<(), IdentityError> {
        let url = format!(
            "{}?updateMask.fieldPaths=firstName&updateMask.fieldPaths=lastName&currentDocument.exists=true",
            self.user_url(session)
        );
        let body = json!({
            "fields": {
                "firstName": FieldValue::StringValue(first_name.to_string()),
                "lastName": FieldValue::StringValue(last_name.to_string()),
            }
        });
        let response = self
            .client
            .patch(url)
            .bearer_auth(&session.id_token)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
