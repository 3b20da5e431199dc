use serde::{Deserialize, Serialize};

/// Body returned by the token endpoint. Older clients read `token`, OAuth2
/// style clients read `access_token`; both carry the same value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub access_token: String,
    pub expires_in: i64,

    /// RFC3339 time the token was issued at.
    pub issued_at: String,
}
