use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::scope::Access;

/// Validity of an issued token, in seconds.
pub const TOKEN_VALIDITY: i64 = 900;

/// JOSE header of an issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    #[serde(rename = "typ")]
    pub token_type: String,

    #[serde(rename = "alg")]
    pub algorithm: String,

    #[serde(rename = "kid", default, skip_serializing_if = "String::is_empty")]
    pub key_id: String,
}

/// Claims of an issued token. Field order is the serialized order, the
/// signature covers these exact bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    #[serde(rename = "iss")]
    pub issuer: String,

    #[serde(rename = "sub")]
    pub subject: String,

    #[serde(rename = "aud")]
    pub audience: String,

    #[serde(rename = "exp")]
    pub expiration: i64,

    #[serde(rename = "nbf")]
    pub not_before: i64,

    #[serde(rename = "iat")]
    pub issued_at: i64,

    #[serde(rename = "jti")]
    pub jwt_id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access: Vec<Access>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<String>,
}

impl Header {
    pub fn new(algorithm: &str, key_id: &str) -> Self {
        Self {
            token_type: String::from("JWT"),
            algorithm: algorithm.to_string(),
            key_id: key_id.to_string(),
        }
    }
}

/// Assembles the claims for a decision made at `issued_at` (unix seconds).
pub fn build_claims(
    issuer: &str,
    access: Vec<Access>,
    audience: &str,
    subject: &str,
    issued_at: i64,
    jwt_id: String,
) -> ClaimSet {
    ClaimSet {
        issuer: issuer.to_string(),
        subject: subject.to_string(),
        audience: audience.to_string(),
        expiration: issued_at + TOKEN_VALIDITY,
        not_before: issued_at,
        issued_at,
        jwt_id,
        access,
        scopes: None,
    }
}

#[inline(always)]
pub fn base64_url_encode<T>(input: T) -> String
where
    T: AsRef<[u8]>,
{
    BASE64_URL_SAFE_NO_PAD.encode(input)
}
