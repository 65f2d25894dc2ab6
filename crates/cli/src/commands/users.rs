//! User record commands.
//!
//! # Usage
//!
//! ```bash
//! # List backend user records
//! outlay users list
//!
//! # Upsert a record for an identity (operator-driven backfill)
//! outlay users sync -i user_2x9f -e maria@example.com --first-name Maria
//! ```
//!
//! # Environment Variables
//!
//! - `OUTLAY_API_URL` - Base URL of the Outlay backend API
//! - `OUTLAY_SERVICE_TOKEN` - Bearer token sent with requests (optional,
//!   depending on deployment policy)

use thiserror::Error;

use outlay_core::IdentityId;
use outlay_shell::api::ApiError;
use outlay_shell::backend::SyncPayload;
use outlay_shell::config::{ConfigError, ShellConfig};
use outlay_shell::error::PreconditionError;
use outlay_shell::identity::Identity;
use outlay_shell::notify::NoticeSink;
use outlay_shell::state::AppState;

/// Errors that can occur during user commands.
#[derive(Debug, Error)]
pub enum UsersError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A backend request failed.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// The supplied identity attributes cannot form a sync payload.
    #[error("Invalid identity attributes: {0}")]
    Precondition(#[from] PreconditionError),
}

/// List backend user records.
///
/// # Errors
///
/// Returns an error if configuration loading or the backend request fails.
#[allow(clippy::print_stdout)]
pub async fn list() -> Result<(), UsersError> {
    let config = ShellConfig::from_env()?;
    let _sentry_guard = super::init_sentry(&config);

    let (notices, _notices_rx) = NoticeSink::channel();
    let state = AppState::new(config, notices)?;

    let token = state.config().service_token.clone();
    let users = state.users().list_users(token.as_ref()).await?;

    tracing::info!("Fetched {} user record(s)", users.len());

    for user in users {
        println!(
            "{}  {}  {}  {} {}",
            user.id,
            user.clerk_id,
            user.email,
            user.first_name.as_deref().unwrap_or("-"),
            user.last_name.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}

/// Arguments for the sync command.
pub struct SyncArgs {
    pub external_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
}

/// Upsert the backend record for an identity.
///
/// Builds the same payload the product shell derives from a signed-in
/// identity, so an operator can backfill a record by hand.
///
/// # Errors
///
/// Returns an error if configuration loading fails, the attributes cannot
/// form a payload, or the backend request fails.
pub async fn sync(args: SyncArgs) -> Result<(), UsersError> {
    let config = ShellConfig::from_env()?;
    let _sentry_guard = super::init_sentry(&config);

    let identity = Identity {
        id: IdentityId::new(args.external_id),
        primary_email: Some(args.email),
        first_name: args.first_name,
        last_name: args.last_name,
        image_url: args.image_url,
    };
    let payload = SyncPayload::for_identity(&identity)?;

    let (notices, _notices_rx) = NoticeSink::channel();
    let state = AppState::new(config, notices)?;

    let token = state.config().service_token.clone();
    let user = state.users().sync_user(&payload, token.as_ref()).await?;

    tracing::info!(
        "User record upserted: id={}, clerk_id={}, email={}",
        user.id,
        user.clerk_id,
        user.email
    );

    Ok(())
}
