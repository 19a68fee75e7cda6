//! In-memory contact repository and seed data.
//!
//! State lives for the process lifetime only; every restart reseeds the
//! original demo contacts and countries.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rolo_contacts::{Contact, Country, NewContact};

/// Validation failure for a contact payload.
#[derive(Debug, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared state behind the Axum handlers.
#[derive(Clone)]
pub struct AppState {
    contacts: Arc<RwLock<HashMap<String, Contact>>>,
    countries: Arc<Vec<Country>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::seeded()
    }
}

impl AppState {
    /// State seeded with the demo contacts and countries.
    #[must_use]
    pub fn seeded() -> Self {
        let contacts = seed_contacts()
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        Self {
            contacts: Arc::new(RwLock::new(contacts)),
            countries: Arc::new(seed_countries()),
        }
    }

    /// Empty state, for tests.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            contacts: Arc::new(RwLock::new(HashMap::new())),
            countries: Arc::new(seed_countries()),
        }
    }

    /// All contacts, ordered by id for stable output.
    pub fn list_contacts(&self) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = self.contacts.read().values().cloned().collect();
        contacts.sort_by(|a, b| a.id.cmp(&b.id));
        contacts
    }

    /// A single contact by id.
    pub fn get_contact(&self, id: &str) -> Option<Contact> {
        self.contacts.read().get(id).cloned()
    }

    /// Validate and insert a contact, assigning a fresh id.
    pub fn create_contact(&self, new: NewContact) -> Result<Contact, ValidationError> {
        validate(&new)?;
        let contact = new.with_id(uuid::Uuid::new_v4().to_string());
        let _ = self
            .contacts
            .write()
            .insert(contact.id.clone(), contact.clone());
        Ok(contact)
    }

    /// Validate and replace an existing contact's fields.
    ///
    /// Returns `Ok(None)` when no contact with `id` exists.
    pub fn update_contact(
        &self,
        id: &str,
        new: NewContact,
    ) -> Result<Option<Contact>, ValidationError> {
        validate(&new)?;
        let mut contacts = self.contacts.write();
        if !contacts.contains_key(id) {
            return Ok(None);
        }
        let contact = new.with_id(id);
        let _ = contacts.insert(id.to_string(), contact.clone());
        Ok(Some(contact))
    }

    /// Delete a contact; `false` if it did not exist.
    pub fn delete_contact(&self, id: &str) -> bool {
        self.contacts.write().remove(id).is_some()
    }

    /// The selectable countries.
    pub fn countries(&self) -> Vec<Country> {
        self.countries.as_ref().clone()
    }
}

/// Required-field and basic email-shape validation, matching the original
/// service layer.
fn validate(contact: &NewContact) -> Result<(), ValidationError> {
    let required = [
        ("first_name", &contact.first_name),
        ("last_name", &contact.last_name),
        ("email", &contact.email),
        ("street_address", &contact.street_address),
        ("city", &contact.city),
        ("country", &contact.country),
    ];
    for (name, value) in required {
        if value.is_empty() {
            return Err(ValidationError(format!("Missing required field: {name}")));
        }
    }

    let domain_has_dot = contact
        .email
        .split_once('@')
        .is_some_and(|(_, domain)| domain.contains('.'));
    if !domain_has_dot {
        return Err(ValidationError("Invalid email format".to_string()));
    }

    Ok(())
}

fn seed_contacts() -> Vec<Contact> {
    let raw = [
        ("1", "John", "Doe", "john.doe@example.com", "123 Main St", "New York", "United States"),
        ("2", "Jane", "Smith", "jane.smith@example.com", "456 Oak Ave", "Toronto", "Canada"),
        ("3", "Carlos", "Rodriguez", "carlos.rodriguez@example.com", "789 Pine Rd", "Madrid", "Spain"),
        ("4", "Marie", "Dubois", "marie.dubois@example.com", "321 Elm St", "Paris", "France"),
        ("5", "Yuki", "Tanaka", "yuki.tanaka@example.com", "654 Cherry Blvd", "Tokyo", "Japan"),
    ];
    raw.into_iter()
        .map(
            |(id, first, last, email, street, city, country)| Contact {
                id: id.to_string(),
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: email.to_string(),
                street_address: street.to_string(),
                city: city.to_string(),
                country: country.to_string(),
            },
        )
        .collect()
}

fn seed_countries() -> Vec<Country> {
    let raw = [
        ("1", "United States"),
        ("2", "Canada"),
        ("3", "United Kingdom"),
        ("4", "France"),
        ("5", "Germany"),
        ("6", "Spain"),
        ("7", "Italy"),
        ("8", "Japan"),
        ("9", "Australia"),
        ("10", "Brazil"),
    ];
    raw.into_iter()
        .map(|(id, name)| Country {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
