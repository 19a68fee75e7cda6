//! # rolo-server
//!
//! In-memory mock API serving the contacts and countries endpoints. Data
//! resets on every start; the demo seed matches the original fixtures.

#![deny(unsafe_code)]

pub mod config;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use server::{router, run};
pub use state::AppState;
