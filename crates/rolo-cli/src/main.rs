//! # rolo
//!
//! Command-line host for the Rolo contacts demo: runs the mock API and
//! drives the OAuth session (login, callback, whoami, logout) plus the
//! contact commands against it.

#![deny(unsafe_code)]

mod callback;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rolo_auth::{
    CallbackParams, FileTokenStore, SessionConfig, SessionManager, SystemNavigator,
};
use rolo_contacts::{ContactsClient, NewContact};
use rolo_server::{AppState, ServerConfig};

use crate::settings::Settings;

/// Rolo contacts demo.
#[derive(Parser, Debug)]
#[command(name = "rolo", about = "Contacts demo: mock API + OAuth session")]
struct Cli {
    /// Path to the settings file (default `~/.rolo/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the mock contacts/countries API.
    Serve {
        /// Host to bind (overrides settings).
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides settings).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Sign in: open the provider login page and wait for the redirect.
    Login,
    /// Complete a login manually from a copy-pasted redirect query string.
    Callback {
        /// The redirect's query string, e.g. `code=abc123`.
        #[arg(long)]
        query: String,
    },
    /// Show the signed-in user.
    Whoami,
    /// Sign out of the provider and clear the local session.
    Logout,
    /// Contact operations against the API.
    Contacts {
        #[command(subcommand)]
        command: ContactsCommand,
    },
    /// List the selectable countries.
    Countries,
}

#[derive(Subcommand, Debug)]
enum ContactsCommand {
    /// List all contacts.
    List,
    /// Show one contact.
    Get {
        /// Contact id.
        id: String,
    },
    /// Create a contact.
    Create {
        #[command(flatten)]
        fields: ContactFields,
    },
    /// Update a contact.
    Update {
        /// Contact id.
        id: String,
        #[command(flatten)]
        fields: ContactFields,
    },
    /// Delete a contact.
    Delete {
        /// Contact id.
        id: String,
    },
}

/// Contact fields shared by create and update.
#[derive(clap::Args, Debug)]
struct ContactFields {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    street_address: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    country: String,
}

impl From<ContactFields> for NewContact {
    fn from(fields: ContactFields) -> Self {
        Self {
            first_name: fields.first_name,
            last_name: fields.last_name,
            email: fields.email,
            street_address: fields.street_address,
            city: fields.city,
            country: fields.country,
        }
    }
}

fn build_manager(settings: &Settings) -> Result<Arc<SessionManager>> {
    let config = SessionConfig::new(
        settings.auth.client_id.clone(),
        settings.auth.identity_domain.clone(),
        settings.auth.redirect_uri.clone(),
        settings.auth.api_base_url.clone(),
    );
    let store = Arc::new(FileTokenStore::new(FileTokenStore::session_file_path(
        &settings::data_dir(),
    )));
    let manager = SessionManager::new(config, store, Arc::new(SystemNavigator))
        .context("incomplete auth settings (set client_id/identity_domain in settings.json or ROLO_* env vars)")?;
    Ok(Arc::new(manager))
}

async fn run_login(manager: &Arc<SessionManager>) -> Result<()> {
    let redirect_uri = manager.config().redirect_uri.clone();
    let Some(port) = callback::loopback_port(&redirect_uri) else {
        bail!(
            "redirect URI {redirect_uri} is not a localhost URI; sign in in the browser \
             and finish with `rolo callback --query <redirect query string>`"
        );
    };

    let url = manager.begin_login();
    println!("Opening provider login page:\n  {url}");

    let params = callback::wait_for_callback(port, callback::DEFAULT_LOGIN_TIMEOUT_SECS).await?;
    finish_callback(manager, &params).await
}

async fn finish_callback(manager: &Arc<SessionManager>, params: &CallbackParams) -> Result<()> {
    if manager.complete_callback(params).await {
        match manager.current_user() {
            Some(user) => println!("Signed in as {}", user.display_name()),
            None => println!("Signed in."),
        }
        Ok(())
    } else {
        bail!("login failed; see the log for the cause")
    }
}

fn print_contact(contact: &rolo_contacts::Contact) {
    println!(
        "{}  {} {}  <{}>  {}, {}, {}",
        contact.id,
        contact.first_name,
        contact.last_name,
        contact.email,
        contact.street_address,
        contact.city,
        contact.country
    );
}

async fn run_contacts(manager: Arc<SessionManager>, command: ContactsCommand) -> Result<()> {
    let client = ContactsClient::new(manager);
    match command {
        ContactsCommand::List => {
            for contact in client.list().await? {
                print_contact(&contact);
            }
        }
        ContactsCommand::Get { id } => print_contact(&client.get(&id).await?),
        ContactsCommand::Create { fields } => {
            let created = client.create(&fields.into()).await?;
            println!("Created:");
            print_contact(&created);
        }
        ContactsCommand::Update { id, fields } => {
            let updated = client.update(&id, &fields.into()).await?;
            println!("Updated:");
            print_contact(&updated);
        }
        ContactsCommand::Delete { id } => {
            client.delete(&id).await?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings_path = args.settings.unwrap_or_else(settings::settings_path);
    let settings = settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("failed to load settings from {}", settings_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("ROLO_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_filter)),
        )
        .init();

    match args.command {
        Command::Serve { host, port } => {
            let config = ServerConfig {
                host: host.unwrap_or(settings.server.host),
                port: port.unwrap_or(settings.server.port),
            };
            rolo_server::run(&config, AppState::seeded())
                .await
                .context("mock API server failed")?;
        }
        Command::Login => {
            let manager = build_manager(&settings)?;
            let _refresh = manager.spawn_refresh_task();
            run_login(&manager).await?;
        }
        Command::Callback { query } => {
            let manager = build_manager(&settings)?;
            let params = CallbackParams::from_query(&query);
            finish_callback(&manager, &params).await?;
        }
        Command::Whoami => {
            let manager = build_manager(&settings)?;
            match manager.current_user() {
                Some(user) if manager.is_authenticated() => {
                    println!("{}", user.display_name());
                    println!("  sub:   {}", user.sub);
                    if let Some(email) = &user.email {
                        println!("  email: {email}");
                    }
                    if !user.groups.is_empty() {
                        println!("  groups: {}", user.groups.join(", "));
                    }
                }
                Some(_) => println!("session expired; run `rolo login`"),
                None => println!("not signed in"),
            }
        }
        Command::Logout => {
            let manager = build_manager(&settings)?;
            let _ = manager.begin_logout();
            println!("Signed out.");
        }
        Command::Contacts { command } => {
            let manager = build_manager(&settings)?;
            let _refresh = manager.spawn_refresh_task();
            run_contacts(manager, command).await?;
        }
        Command::Countries => {
            let manager = build_manager(&settings)?;
            let client = ContactsClient::new(manager);
            for country in client.countries().await? {
                println!("{}  {}", country.id, country.name);
            }
        }
    }

    Ok(())
}
