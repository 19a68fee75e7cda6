//! Contact and country domain types, plus the API response envelope.

use serde::{Deserialize, Serialize};

/// A contact record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Unique identifier.
    pub id: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Street address.
    pub street_address: String,
    /// City.
    pub city: String,
    /// Country name.
    pub country: String,
}

/// Contact fields without an id, for create/update requests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Street address.
    pub street_address: String,
    /// City.
    pub city: String,
    /// Country name.
    pub country: String,
}

impl NewContact {
    /// Attach an id, producing a full [`Contact`].
    #[must_use]
    pub fn with_id(self, id: impl Into<String>) -> Contact {
        Contact {
            id: id.into(),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            street_address: self.street_address,
            city: self.city,
            country: self.country,
        }
    }
}

/// A selectable country.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Envelope every API endpoint responds with.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Payload, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error description, present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Successful envelope wrapping `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed envelope with an error message.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
