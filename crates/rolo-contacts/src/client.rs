//! Authenticated API client for the contacts service.
//!
//! The single client every host uses; all requests go through
//! [`SessionManager::authorized_fetch`] so they carry the session's bearer
//! token.

use std::sync::Arc;

use reqwest::Method;
use rolo_auth::{AuthError, FetchOptions, SessionManager};
use serde::de::DeserializeOwned;

use crate::types::{ApiEnvelope, Contact, Country, NewContact};

/// Errors surfaced by the contacts client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Session-level failure (anonymous, transport, …).
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The API answered with a failure envelope or an empty payload.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status of the response.
        status: u16,
        /// The envelope's error string, or a generic message.
        message: String,
    },

    /// Response body could not be parsed.
    #[error("malformed API response: {0}")]
    Malformed(#[from] reqwest::Error),
}

/// Client for the contacts/countries API.
pub struct ContactsClient {
    manager: Arc<SessionManager>,
}

impl ContactsClient {
    /// Create a client over an existing session manager.
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }

    /// Fetch all contacts.
    pub async fn list(&self) -> Result<Vec<Contact>, ClientError> {
        self.request(Method::GET, "/contacts", None).await
    }

    /// Fetch a single contact.
    pub async fn get(&self, id: &str) -> Result<Contact, ClientError> {
        self.request(Method::GET, &format!("/contacts/{id}"), None)
            .await
    }

    /// Create a contact; the server assigns the id.
    pub async fn create(&self, contact: &NewContact) -> Result<Contact, ClientError> {
        let body = serde_json::to_value(contact).map_err(AuthError::Json)?;
        self.request(Method::POST, "/contacts", Some(body)).await
    }

    /// Replace an existing contact's fields.
    pub async fn update(&self, id: &str, contact: &NewContact) -> Result<Contact, ClientError> {
        let body = serde_json::to_value(contact).map_err(AuthError::Json)?;
        self.request(Method::PUT, &format!("/contacts/{id}"), Some(body))
            .await
    }

    /// Delete a contact.
    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        // DELETE responds with an envelope whose data is an informational
        // message; only success matters here.
        let _: serde_json::Value = self
            .request(Method::DELETE, &format!("/contacts/{id}"), None)
            .await?;
        Ok(())
    }

    /// Fetch the selectable countries.
    pub async fn countries(&self) -> Result<Vec<Country>, ClientError> {
        self.request(Method::GET, "/countries", None).await
    }

    /// Issue an authorized request and unwrap the response envelope:
    /// `success` with data yields the payload, anything else the error string.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ClientError> {
        let options = match body {
            Some(body) => FetchOptions::json(method, body),
            None => FetchOptions::method(method),
        };
        let response = self.manager.authorized_fetch(path, options).await?;
        let status = response.status().as_u16();
        let envelope: ApiEnvelope<T> = response.json().await?;

        match (envelope.success, envelope.data) {
            (true, Some(data)) => Ok(data),
            (_, _) => Err(ClientError::Api {
                status,
                message: envelope
                    .error
                    .unwrap_or_else(|| "request failed".to_string()),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rolo_auth::{MemoryTokenStore, LoggingNavigator, SessionConfig, TokenRecord, TokenStore, now_ms};
    use wiremock::matchers::{body_partial_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn authed_client(api: &MockServer) -> ContactsClient {
        let store = Arc::new(MemoryTokenStore::new());
        store
            .save(&TokenRecord {
                access_token: "at".to_string(),
                id_token: "h.e30.s".to_string(),
                refresh_token: "rt".to_string(),
                expires_at_ms: now_ms() + 3_600_000,
            })
            .unwrap();
        let config = SessionConfig::new("cid", "auth.example.com", "http://cb", api.uri());
        let manager =
            Arc::new(SessionManager::new(config, store, Arc::new(LoggingNavigator)).unwrap());
        ContactsClient::new(manager)
    }

    fn contact_json(id: &str, first: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "first_name": first,
            "last_name": "Doe",
            "email": "x@example.com",
            "street_address": "1 St",
            "city": "Town",
            "country": "Canada",
        })
    }

    #[tokio::test]
    async fn list_unwraps_envelope() {
        let api = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contacts"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": [contact_json("1", "John")],
            })))
            .mount(&api)
            .await;

        let client = authed_client(&api).await;
        let contacts = client.list().await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].first_name, "John");
    }

    #[tokio::test]
    async fn get_propagates_envelope_error() {
        let api = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contacts/99"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "success": false,
                "error": "Contact not found",
            })))
            .mount(&api)
            .await;

        let client = authed_client(&api).await;
        let err = client.get("99").await.unwrap_err();
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Contact not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn create_posts_contact_body() {
        let api = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contacts"))
            .and(body_partial_json(serde_json::json!({"first_name": "Jane"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "success": true,
                "data": contact_json("7", "Jane"),
            })))
            .expect(1)
            .mount(&api)
            .await;

        let client = authed_client(&api).await;
        let created = client
            .create(&NewContact {
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                email: "x@example.com".to_string(),
                street_address: "1 St".to_string(),
                city: "Town".to_string(),
                country: "Canada".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(created.id, "7");
    }

    #[tokio::test]
    async fn delete_accepts_message_payload() {
        let api = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/contacts/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": { "message": "Contact deleted successfully" },
            })))
            .mount(&api)
            .await;

        let client = authed_client(&api).await;
        client.delete("1").await.unwrap();
    }

    #[tokio::test]
    async fn anonymous_client_fails_with_auth_error() {
        let api = MockServer::start().await;
        let store = Arc::new(MemoryTokenStore::new());
        let config = SessionConfig::new("cid", "auth.example.com", "http://cb", api.uri());
        let manager =
            Arc::new(SessionManager::new(config, store, Arc::new(LoggingNavigator)).unwrap());
        let client = ContactsClient::new(manager);

        let err = client.list().await.unwrap_err();
        assert!(matches!(err, ClientError::Auth(AuthError::NoValidSession)));
    }

    #[tokio::test]
    async fn success_without_data_is_an_api_error() {
        let api = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/countries"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "success": true })),
            )
            .mount(&api)
            .await;

        let client = authed_client(&api).await;
        let err = client.countries().await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 200, .. }));
    }
}
