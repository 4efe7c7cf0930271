//! Domain error types shared by the core and the providers.

use reqwest::StatusCode;

/// A failed read from the quote source. The quote fetcher absorbs these and
/// reports "no data" to its callers.
#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("HTTP error: {status} for {url}")]
    Http { status: StatusCode, url: String },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to parse quote response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RateError {
    #[error("invalid rate {0}: rates must be positive")]
    InvalidRate(f64),

    #[error("statistics requested over an empty series")]
    EmptySeries,
}

/// Failures from the identity provider and the profile document store.
/// Messages are shown to the user as-is.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Incorrect current password.")]
    WrongCurrentPassword,

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("No account exists for this email.")]
    UserNotFound,

    #[error("An account already exists for this email.")]
    EmailExists,

    #[error("Weak password: {0}")]
    WeakPassword(String),

    #[error("New passwords do not match.")]
    PasswordMismatch,

    #[error("Password must be at least 6 characters.")]
    PasswordTooShort,

    #[error("You are not signed in. Run `nomisma login` first.")]
    NotSignedIn,

    #[error("Your session has expired. Please sign in again.")]
    SessionExpired,

    #[error("Identity provider rejected the request: {0}")]
    Rejected(String),

    #[error("Profile store error: {0}")]
    Document(String),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}
