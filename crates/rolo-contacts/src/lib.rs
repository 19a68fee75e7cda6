//! # rolo-contacts
//!
//! Shared contact/country domain types and the authenticated API client.
//!
//! The client is the single path through which hosts reach the contacts
//! service; every request is issued via the session manager so it carries the
//! current bearer token.

#![deny(unsafe_code)]

pub mod client;
pub mod types;

pub use client::{ClientError, ContactsClient};
pub use types::{ApiEnvelope, Contact, Country, NewContact};
