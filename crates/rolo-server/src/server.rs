//! Axum router and request handlers for the mock API.
//!
//! Every endpoint answers with the `{success, data?, error?}` envelope the
//! original handlers used. The server does not verify bearer tokens — in the
//! real deployment the gateway in front of it does — it only logs whether one
//! was presented.

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::get;
use rolo_contacts::{ApiEnvelope, Contact, Country, NewContact};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Health check payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always true when the server answers.
    pub success: bool,
    /// Human-readable status line.
    pub message: String,
    /// Current time, RFC 3339.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
}

/// Build the router with all routes and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/contacts", get(list_contacts).post(create_contact))
        .route(
            "/contacts/{id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
        .route("/countries", get(list_countries))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn run(config: &ServerConfig, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "mock API listening");
    axum::serve(listener, router(state)).await
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "Contact Manager API is healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /contacts
async fn list_contacts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<ApiEnvelope<Vec<Contact>>> {
    log_bearer(&headers);
    Json(ApiEnvelope::ok(state.list_contacts()))
}

/// GET /contacts/{id}
async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ApiEnvelope<Contact>>) {
    match state.get_contact(&id) {
        Some(contact) => (StatusCode::OK, Json(ApiEnvelope::ok(contact))),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiEnvelope::err("Contact not found")),
        ),
    }
}

/// POST /contacts
async fn create_contact(
    State(state): State<AppState>,
    Json(new): Json<NewContact>,
) -> (StatusCode, Json<ApiEnvelope<Contact>>) {
    match state.create_contact(new) {
        Ok(contact) => (StatusCode::CREATED, Json(ApiEnvelope::ok(contact))),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ApiEnvelope::err(e.to_string())),
        ),
    }
}

/// PUT /contacts/{id}
async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(new): Json<NewContact>,
) -> (StatusCode, Json<ApiEnvelope<Contact>>) {
    match state.update_contact(&id, new) {
        Ok(Some(contact)) => (StatusCode::OK, Json(ApiEnvelope::ok(contact))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiEnvelope::err("Contact not found")),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ApiEnvelope::err(e.to_string())),
        ),
    }
}

/// DELETE /contacts/{id}
async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ApiEnvelope<serde_json::Value>>) {
    if state.delete_contact(&id) {
        (
            StatusCode::OK,
            Json(ApiEnvelope::ok(serde_json::json!({
                "message": "Contact deleted successfully"
            }))),
        )
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ApiEnvelope::err("Contact not found")),
        )
    }
}

/// GET /countries
async fn list_countries(State(state): State<AppState>) -> Json<ApiEnvelope<Vec<Country>>> {
    Json(ApiEnvelope::ok(state.countries()))
}

fn log_bearer(headers: &HeaderMap) {
    let present = headers.contains_key(header::AUTHORIZATION);
    tracing::debug!(bearer_present = present, "contacts request");
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::seeded())
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn valid_body() -> serde_json::Value {
        serde_json::json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "street_address": "1 Analytical Way",
            "city": "London",
            "country": "United Kingdom",
        })
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let resp = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let parsed = body_json(resp).await;
        assert_eq!(parsed["success"], true);
        assert!(parsed["message"].as_str().unwrap().contains("healthy"));
        assert!(parsed.get("timestamp").is_some());
    }

    #[tokio::test]
    async fn list_contacts_returns_seed_data() {
        let resp = app()
            .oneshot(
                Request::builder()
                    .uri("/contacts")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let parsed = body_json(resp).await;
        assert_eq!(parsed["success"], true);
        assert_eq!(parsed["data"].as_array().unwrap().len(), 5);
        assert_eq!(parsed["data"][0]["first_name"], "John");
    }

    #[tokio::test]
    async fn get_contact_by_id() {
        let resp = app()
            .oneshot(
                Request::builder()
                    .uri("/contacts/2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let parsed = body_json(resp).await;
        assert_eq!(parsed["data"]["last_name"], "Smith");
    }

    #[tokio::test]
    async fn get_missing_contact_is_404() {
        let resp = app()
            .oneshot(
                Request::builder()
                    .uri("/contacts/99")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let parsed = body_json(resp).await;
        assert_eq!(parsed["success"], false);
        assert_eq!(parsed["error"], "Contact not found");
    }

    #[tokio::test]
    async fn create_contact_returns_201_with_id() {
        let resp = app()
            .oneshot(json_request("POST", "/contacts", valid_body()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let parsed = body_json(resp).await;
        assert_eq!(parsed["success"], true);
        assert!(!parsed["data"]["id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_contact_validates_fields() {
        let mut body = valid_body();
        body["email"] = serde_json::json!("not-an-email");
        let resp = app()
            .oneshot(json_request("POST", "/contacts", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let parsed = body_json(resp).await;
        assert_eq!(parsed["error"], "Invalid email format");
    }

    #[tokio::test]
    async fn update_contact_replaces_record() {
        let mut body = valid_body();
        body["first_name"] = serde_json::json!("Johnny");
        let resp = app()
            .oneshot(json_request("PUT", "/contacts/1", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let parsed = body_json(resp).await;
        assert_eq!(parsed["data"]["first_name"], "Johnny");
        assert_eq!(parsed["data"]["id"], "1");
    }

    #[tokio::test]
    async fn update_missing_contact_is_404() {
        let resp = app()
            .oneshot(json_request("PUT", "/contacts/99", valid_body()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_contact_then_404() {
        let app = app();

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/contacts/3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/contacts/3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn countries_returns_seed_list() {
        let resp = app()
            .oneshot(
                Request::builder()
                    .uri("/countries")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let parsed = body_json(resp).await;
        assert_eq!(parsed["data"].as_array().unwrap().len(), 10);
        assert_eq!(parsed["data"][0]["name"], "United States");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let resp = app()
            .oneshot(
                Request::builder()
                    .uri("/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
