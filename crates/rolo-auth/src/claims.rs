//! Identity claims carried in the id token.
//!
//! The payload segment is base64url-decoded and parsed without signature
//! verification: the upstream API gateway validates tokens in deployment, so
//! the client treats the claims as display data, never as an authorization
//! decision.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use crate::errors::AuthError;

/// Typed identity claims projected from the id token payload.
///
/// Optional claims fall back to `None`/empty rather than failing the decode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct IdentityClaims {
    /// Subject identifier.
    pub sub: String,
    /// Email address, if the provider released it.
    #[serde(default)]
    pub email: Option<String>,
    /// Whether the provider has verified the email address.
    #[serde(default)]
    pub email_verified: bool,
    /// Provider-side username.
    #[serde(default, rename = "cognito:username")]
    pub username: Option<String>,
    /// Given name.
    #[serde(default)]
    pub given_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub family_name: Option<String>,
    /// Group memberships, empty when the claim is absent.
    #[serde(default, rename = "cognito:groups")]
    pub groups: Vec<String>,
}

impl IdentityClaims {
    /// A display name: given/family name, falling back to username, email,
    /// then subject.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.given_name, &self.family_name) {
            (Some(given), Some(family)) => format!("{given} {family}"),
            (Some(given), None) => given.clone(),
            _ => self
                .username
                .clone()
                .or_else(|| self.email.clone())
                .unwrap_or_else(|| self.sub.clone()),
        }
    }
}

/// Decode the claims segment of a JWT-shaped id token.
pub fn decode_id_token(id_token: &str) -> Result<IdentityClaims, AuthError> {
    let mut segments = id_token.split('.');
    let payload = segments
        .nth(1)
        .ok_or_else(|| AuthError::ClaimDecodeFailed("missing payload segment".to_string()))?;

    // Tokens in the wild carry both padded and unpadded payloads.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::ClaimDecodeFailed(format!("base64: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::ClaimDecodeFailed(format!("claims JSON: {e}")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
