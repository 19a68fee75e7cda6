//! # rolo-auth
//!
//! OAuth2 session token manager for the Rolo contacts app.
//!
//! Owns the authorization-code flow against the identity provider, persists
//! the resulting token record, exposes an authenticated-fetch capability and
//! runs a background task that refreshes the token set before expiry.
//!
//! The token record is the only unit of session state: it is written and
//! cleared whole, its expiry always comes from a server-supplied lifetime,
//! and "a non-expired record exists" is the sole authentication predicate.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rolo_auth::{FileTokenStore, SessionConfig, SessionManager, SystemNavigator};
//!
//! # async fn run() -> Result<(), rolo_auth::AuthError> {
//! let config = SessionConfig::new(
//!     "my-client-id",
//!     "auth.example.com",
//!     "http://localhost:9876/callback",
//!     "https://api.example.com",
//! );
//! let store = Arc::new(FileTokenStore::new("/home/user/.rolo/session.json"));
//! let manager = Arc::new(SessionManager::new(config, store, Arc::new(SystemNavigator))?);
//! let _refresh = manager.spawn_refresh_task();
//!
//! if !manager.is_authenticated() {
//!     let _login_url = manager.begin_login();
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod claims;
pub mod errors;
pub mod manager;
pub mod navigator;
pub mod store;
pub mod types;

pub use claims::{IdentityClaims, decode_id_token};
pub use errors::AuthError;
pub use manager::{FetchOptions, RefreshTask, SessionManager};
pub use navigator::{LoggingNavigator, Navigator, SystemNavigator};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use types::{CallbackParams, SessionConfig, TokenRecord, expires_at_from, now_ms};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
