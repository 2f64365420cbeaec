use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Bearer token handed out by a [`CredentialProvider`](super::CredentialProvider).
///
/// # Example
/// ```
/// use agentlab::auth::AccessToken;
///
/// let token = AccessToken::new("opaque-token");
/// assert!(!token.expires_within(chrono::Duration::minutes(5)));
/// ```
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Token without a known expiry.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the token expires before `now + margin`.
    pub fn expires_within(&self, margin: Duration) -> bool {
        self.expires_at
            .map(|exp| exp <= Utc::now() + margin)
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"..")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
