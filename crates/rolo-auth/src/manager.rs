//! The session token manager.
//!
//! Owns the authorization-code flow against the identity provider, the
//! persisted token record, the authorized-fetch capability and the background
//! refresh task. The informal state machine:
//!
//! ```text
//! Anonymous --begin_login--> provider --complete_callback ok--> Authenticated
//! Authenticated --refresh ok--> Authenticated
//! Authenticated --refresh failure | begin_logout--> Anonymous
//! ```

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use crate::claims::{IdentityClaims, decode_id_token};
use crate::errors::AuthError;
use crate::navigator::Navigator;
use crate::store::TokenStore;
use crate::types::{CallbackParams, SessionConfig, TokenRecord, TokenResponse, expires_at_from, now_ms};

/// Options for an authorized fetch.
#[derive(Debug, Default)]
pub struct FetchOptions {
    /// HTTP method (default GET).
    pub method: Option<reqwest::Method>,
    /// Extra request headers. `Authorization` and `Content-Type` are always
    /// set by the manager and win over caller-supplied values.
    pub headers: Vec<(String, String)>,
    /// JSON request body.
    pub body: Option<serde_json::Value>,
}

impl FetchOptions {
    /// GET with no body.
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    /// Method + JSON body.
    #[must_use]
    pub fn json(method: reqwest::Method, body: serde_json::Value) -> Self {
        Self {
            method: Some(method),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    /// Method with no body.
    #[must_use]
    pub fn method(method: reqwest::Method) -> Self {
        Self {
            method: Some(method),
            headers: Vec::new(),
            body: None,
        }
    }
}

/// Guard for the background refresh task. Aborts the task when destroyed or
/// dropped, so the recurring callback never outlives its owner.
pub struct RefreshTask {
    handle: tokio::task::JoinHandle<()>,
}

impl RefreshTask {
    /// Stop the periodic refresh check.
    pub fn destroy(&self) {
        self.handle.abort();
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Sole owner of the token record and the OAuth flow around it.
///
/// Explicitly constructed and passed by reference (no process-global state);
/// hosts share it via [`Arc`].
pub struct SessionManager {
    config: SessionConfig,
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    http: reqwest::Client,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Build a manager from validated configuration.
    pub fn new(
        config: SessionConfig,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, AuthError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            config,
            store,
            navigator,
            http,
        })
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Send the user to the provider's hosted login page.
    ///
    /// Returns the URL that was navigated to, so hosts can surface it.
    pub fn begin_login(&self) -> String {
        let url = self.config.login_url();
        tracing::info!("redirecting to provider login");
        self.navigator.navigate(&url);
        url
    }

    /// Clear the session and send the user to the provider's logout page.
    pub fn begin_logout(&self) -> String {
        self.clear_session();
        let url = self.config.logout_url();
        tracing::info!("redirecting to provider logout");
        self.navigator.navigate(&url);
        url
    }

    /// Complete a pending OAuth callback by exchanging the authorization code
    /// for a token record.
    ///
    /// Returns `true` only when a full record was written. Every failure mode
    /// (provider error parameter, missing code, non-2xx exchange, transport or
    /// parse fault) is logged and absorbed into `false` with no state change.
    #[tracing::instrument(skip_all)]
    pub async fn complete_callback(&self, params: &CallbackParams) -> bool {
        if let Some(error) = &params.error {
            tracing::warn!(%error, "provider returned an error on callback");
            return false;
        }
        let Some(code) = &params.code else {
            // Normal page load without a pending callback.
            return false;
        };

        let response = match self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("client_id", &self.config.client_id),
                ("code", code),
                ("redirect_uri", &self.config.redirect_uri),
            ])
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("code exchange failed: {e}");
                return false;
            }
        };

        let Some(refresh_token) = response.refresh_token else {
            tracing::warn!("token endpoint omitted refresh_token on code exchange");
            return false;
        };

        let record = TokenRecord {
            access_token: response.access_token,
            id_token: response.id_token,
            refresh_token,
            expires_at_ms: expires_at_from(response.expires_in),
        };
        if let Err(e) = self.store.save(&record) {
            tracing::warn!("failed to persist token record: {e}");
            return false;
        }

        tracing::info!("session established");
        true
    }

    /// Whether a non-expired token record exists. Pure; no network calls.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.store
            .load()
            .is_some_and(|record| record.is_valid_at(now_ms()))
    }

    /// Identity claims from the stored id token, or `None` without a record
    /// or on a malformed payload.
    #[must_use]
    pub fn current_user(&self) -> Option<IdentityClaims> {
        let record = self.store.load()?;
        match decode_id_token(&record.id_token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::warn!("failed to decode id token: {e}");
                None
            }
        }
    }

    /// Issue a request to `{api_base_url}{path}` carrying the session's
    /// bearer token.
    ///
    /// Fails with [`AuthError::NoValidSession`] when anonymous; refresh is
    /// the background task's job, not this call's. HTTP error responses are
    /// returned, not raised — callers interpret status themselves.
    #[tracing::instrument(skip_all, fields(path))]
    pub async fn authorized_fetch(
        &self,
        path: &str,
        options: FetchOptions,
    ) -> Result<reqwest::Response, AuthError> {
        let record = self
            .store
            .load()
            .filter(|r| r.is_valid_at(now_ms()))
            .ok_or(AuthError::NoValidSession)?;

        let mut headers = HeaderMap::new();
        for (key, value) in &options.headers {
            match (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    let _ = headers.insert(name, value);
                }
                _ => tracing::warn!(%key, "skipping invalid request header"),
            }
        }
        // The bearer token is the id token: the upstream gateway validates it.
        let bearer = HeaderValue::from_str(&format!("Bearer {}", record.id_token))
            .map_err(|_| AuthError::NoValidSession)?;
        let _ = headers.insert(AUTHORIZATION, bearer);
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let url = format!(
            "{}{}",
            self.config.api_base_url.trim_end_matches('/'),
            path
        );
        let method = options.method.unwrap_or(reqwest::Method::GET);
        let mut request = self.http.request(method, &url).headers(headers);
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Refresh the token record if it expires within the configured margin.
    ///
    /// Called by the background task; returns whether a valid session remains.
    /// On any refresh failure the record is cleared (forcing re-login) and the
    /// cause is logged; nothing is raised out of the timer path.
    #[tracing::instrument(skip_all)]
    pub async fn refresh_if_needed(&self) -> bool {
        let Some(record) = self.store.load() else {
            return false;
        };
        let now = now_ms();
        if !record.is_valid_at(now) {
            return false;
        }
        if record.expires_at_ms - now >= self.config.refresh_margin_ms {
            return true;
        }

        tracing::info!("session expiring soon, refreshing");
        let response = match self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("client_id", &self.config.client_id),
                ("refresh_token", &record.refresh_token),
            ])
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("token refresh failed, clearing session: {e}");
                self.clear_session();
                return false;
            }
        };

        // The provider does not rotate the refresh token; keep the original.
        let renewed = TokenRecord {
            access_token: response.access_token,
            id_token: response.id_token,
            refresh_token: record.refresh_token,
            expires_at_ms: expires_at_from(response.expires_in),
        };
        if let Err(e) = self.store.save(&renewed) {
            tracing::warn!("failed to persist refreshed record: {e}");
            self.clear_session();
            return false;
        }
        true
    }

    /// Delete the token record. Idempotent.
    pub fn clear_session(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("failed to clear token record: {e}");
        }
    }

    /// Spawn the periodic refresh check. The returned guard must be kept
    /// alive for the session's lifetime; dropping it (or calling
    /// [`RefreshTask::destroy`]) stops the timer.
    pub fn spawn_refresh_task(self: &Arc<Self>) -> RefreshTask {
        let manager = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(manager.config.check_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so a freshly
            // exchanged record is not re-checked at once.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let _ = manager.refresh_if_needed().await;
            }
        });
        RefreshTask { handle }
    }

    /// POST a form to the provider token endpoint and parse the token set.
    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let resp = self
            .http
            .post(self.config.token_url())
            .form(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(AuthError::ProviderExchangeFailed {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
