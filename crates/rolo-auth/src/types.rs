//! Core session types.
//!
//! The [`TokenRecord`] serialization mirrors the original storage schema:
//! string keys `access_token`, `id_token`, `refresh_token` and `token_expiry`
//! (stringified epoch milliseconds), all written and cleared together.

use serde::{Deserialize, Serialize};

/// Immutable configuration for a [`crate::SessionManager`].
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Client identifier issued by the identity provider.
    pub client_id: String,
    /// Base host for the provider's login/logout/token endpoints,
    /// e.g. `auth.example.com`.
    pub identity_domain: String,
    /// URI the provider redirects back to after login and logout.
    pub redirect_uri: String,
    /// Base URL of the protected API that authorized fetches target.
    pub api_base_url: String,
    /// Refresh when less than this many milliseconds of lifetime remain.
    pub refresh_margin_ms: i64,
    /// How often the background task evaluates a refresh.
    pub check_interval: std::time::Duration,
    /// Timeout applied to token-endpoint and authorized-fetch requests.
    pub request_timeout: std::time::Duration,
}

impl SessionConfig {
    /// Create a config with default tunables (5 min margin, 60 s check
    /// interval, 15 s request timeout).
    pub fn new(
        client_id: impl Into<String>,
        identity_domain: impl Into<String>,
        redirect_uri: impl Into<String>,
        api_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            identity_domain: identity_domain.into(),
            redirect_uri: redirect_uri.into(),
            api_base_url: api_base_url.into(),
            refresh_margin_ms: 5 * 60 * 1000,
            check_interval: std::time::Duration::from_secs(60),
            request_timeout: std::time::Duration::from_secs(15),
        }
    }

    /// Validate that all required fields are present.
    pub fn validate(&self) -> Result<(), crate::AuthError> {
        if self.client_id.is_empty() {
            return Err(crate::AuthError::NotInitialized("client_id"));
        }
        if self.identity_domain.is_empty() {
            return Err(crate::AuthError::NotInitialized("identity_domain"));
        }
        if self.redirect_uri.is_empty() {
            return Err(crate::AuthError::NotInitialized("redirect_uri"));
        }
        if self.api_base_url.is_empty() {
            return Err(crate::AuthError::NotInitialized("api_base_url"));
        }
        Ok(())
    }

    /// Provider origin. `identity_domain` is normally a bare host served over
    /// https; a full `http(s)://` origin is accepted for local stubs.
    fn origin(&self) -> String {
        if self.identity_domain.starts_with("http://")
            || self.identity_domain.starts_with("https://")
        {
            self.identity_domain.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", self.identity_domain)
        }
    }

    /// Provider token endpoint (`POST`, form-encoded).
    pub fn token_url(&self) -> String {
        format!("{}/oauth2/token", self.origin())
    }

    /// Hosted login page with the authorization-code parameters.
    pub fn login_url(&self) -> String {
        format!(
            "{}/login?client_id={}&response_type=code&scope={}&redirect_uri={}",
            self.origin(),
            urlencoding::encode(&self.client_id),
            urlencoding::encode("openid email profile"),
            urlencoding::encode(&self.redirect_uri),
        )
    }

    /// Hosted logout page.
    pub fn logout_url(&self) -> String {
        format!(
            "{}/logout?client_id={}&logout_uri={}",
            self.origin(),
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
        )
    }
}

/// The persisted token set representing one session.
///
/// A record is always written and cleared as a whole; readers never observe a
/// partial record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Opaque bearer token issued by the provider.
    pub access_token: String,
    /// Signed token carrying identity claims (not verified client-side).
    pub id_token: String,
    /// Opaque token used to obtain a new access/id pair.
    pub refresh_token: String,
    /// Absolute expiry of `access_token`/`id_token`, epoch milliseconds.
    #[serde(rename = "token_expiry", with = "epoch_ms_string")]
    pub expires_at_ms: i64,
}

impl TokenRecord {
    /// Whether the record is still valid at `now_ms`.
    #[must_use]
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        self.expires_at_ms > now_ms
    }
}

/// `token_expiry` is stored as a string, matching the original schema where
/// every storage value is a string.
mod epoch_ms_string {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(v: &i64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// Token endpoint response body.
///
/// `refresh_token` is absent on `grant_type=refresh_token` responses — the
/// provider does not rotate it.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Opaque bearer token.
    pub access_token: String,
    /// Signed identity token.
    pub id_token: String,
    /// Refresh token (code exchange only).
    pub refresh_token: Option<String>,
    /// Lifetime of the new tokens in seconds.
    pub expires_in: i64,
}

/// Parsed query parameters of an OAuth redirect callback.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
    /// Authorization code, if the provider granted one.
    pub code: Option<String>,
    /// Provider error code, if the login failed or was cancelled.
    pub error: Option<String>,
}

impl CallbackParams {
    /// Parse a raw query string (`code=abc&state=…`), with or without a
    /// leading `?`. Unknown parameters are ignored.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for pair in query.trim_start_matches('?').split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = urlencoding::decode(value)
                .map(std::borrow::Cow::into_owned)
                .unwrap_or_else(|_| value.to_string());
            match key {
                "code" => params.code = Some(value),
                "error" => params.error = Some(value),
                _ => {}
            }
        }
        params
    }
}

/// Current time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

/// Absolute expiry instant from a server-supplied lifetime in seconds.
#[must_use]
pub fn expires_at_from(expires_in_secs: i64) -> i64 {
    now_ms() + expires_in_secs * 1000
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_record_serializes_with_storage_keys() {
        let record = TokenRecord {
            access_token: "at".to_string(),
            id_token: "it".to_string(),
            refresh_token: "rt".to_string(),
            expires_at_ms: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["access_token"], "at");
        assert_eq!(json["id_token"], "it");
        assert_eq!(json["refresh_token"], "rt");
        // Stringified, matching the original storage schema.
        assert_eq!(json["token_expiry"], "1700000000000");
    }

    #[test]
    fn token_record_roundtrip() {
        let record = TokenRecord {
            access_token: "a".to_string(),
            id_token: "b".to_string(),
            refresh_token: "c".to_string(),
            expires_at_ms: 42,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: TokenRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn record_validity_boundary() {
        let record = TokenRecord {
            access_token: String::new(),
            id_token: String::new(),
            refresh_token: String::new(),
            expires_at_ms: 1000,
        };
        assert!(record.is_valid_at(999));
        assert!(!record.is_valid_at(1000));
        assert!(!record.is_valid_at(1001));
    }

    #[test]
    fn callback_params_from_query() {
        let params = CallbackParams::from_query("?code=abc123&state=xyz");
        assert_eq!(params.code.as_deref(), Some("abc123"));
        assert_eq!(params.error, None);
    }

    #[test]
    fn callback_params_error_decoded() {
        let params = CallbackParams::from_query("error=access_denied&error_description=no%20thanks");
        assert_eq!(params.error.as_deref(), Some("access_denied"));
        assert_eq!(params.code, None);
    }

    #[test]
    fn callback_params_empty_query() {
        assert_eq!(CallbackParams::from_query(""), CallbackParams::default());
    }

    #[test]
    fn login_url_contains_required_params() {
        let cfg = SessionConfig::new("cid", "auth.example.com", "http://localhost:9876/callback", "http://api");
        let url = cfg.login_url();
        assert!(url.starts_with("https://auth.example.com/login?"));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A9876%2Fcallback"));
    }

    #[test]
    fn logout_url_contains_logout_uri() {
        let cfg = SessionConfig::new("cid", "auth.example.com", "http://localhost/cb", "http://api");
        let url = cfg.logout_url();
        assert!(url.starts_with("https://auth.example.com/logout?"));
        assert!(url.contains("logout_uri=http%3A%2F%2Flocalhost%2Fcb"));
    }

    #[test]
    fn explicit_origin_is_respected() {
        let cfg = SessionConfig::new("cid", "http://127.0.0.1:4444/", "r", "a");
        assert_eq!(cfg.token_url(), "http://127.0.0.1:4444/oauth2/token");
    }

    #[test]
    fn validate_rejects_empty_fields() {
        let cfg = SessionConfig::new("", "d", "r", "a");
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("client_id"));
    }

    #[test]
    fn expires_at_is_in_the_future() {
        let at = expires_at_from(3600);
        assert!(at > now_ms());
        assert!(at <= now_ms() + 3_600_000);
    }
}
