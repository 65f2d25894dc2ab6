//! Application state shared across the shell.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::backend::UserGateway;
use crate::config::ShellConfig;
use crate::notify::NoticeSink;

/// Application state shared across the shell.
///
/// Cheaply cloneable via `Arc`; bundles configuration with the backend
/// clients the rest of the application uses.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ShellConfig,
    api: ApiClient,
    users: UserGateway,
    notices: NoticeSink,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: ShellConfig, notices: NoticeSink) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config)?;
        let users = UserGateway::new(api.clone(), config.user_cache_ttl);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                users,
                notices,
            }),
        })
    }

    /// Get a reference to the shell configuration.
    #[must_use]
    pub fn config(&self) -> &ShellConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the user gateway.
    #[must_use]
    pub fn users(&self) -> &UserGateway {
        &self.inner.users
    }

    /// Get a reference to the notice sink.
    #[must_use]
    pub fn notices(&self) -> &NoticeSink {
        &self.inner.notices
    }
}
