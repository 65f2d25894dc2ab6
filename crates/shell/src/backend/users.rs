//! User gateway operations with a cached user list.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::SecretString;
use tracing::{debug, instrument};

use super::{SyncPayload, SyncedUser};
use crate::api::{ApiClient, ApiError};

/// Path of the user collection endpoint.
const USERS_PATH: &str = "/api/v1/users";

/// Cache key for the user list (single-entry cache).
const USER_LIST_KEY: &str = "users:list";

/// Typed operations on the backend user API.
///
/// The user list is cached until its TTL expires; a successful sync
/// invalidates it because the set of users may have changed.
#[derive(Clone)]
pub struct UserGateway {
    inner: Arc<UserGatewayInner>,
}

struct UserGatewayInner {
    api: ApiClient,
    cache: Cache<String, Arc<Vec<SyncedUser>>>,
}

impl UserGateway {
    /// Create a new gateway over `api`, caching the user list for `list_ttl`.
    #[must_use]
    pub fn new(api: ApiClient, list_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(8)
            .time_to_live(list_ttl)
            .build();

        Self {
            inner: Arc::new(UserGatewayInner { api, cache }),
        }
    }

    /// Fetch all users, served from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token))]
    pub async fn list_users(
        &self,
        token: Option<&SecretString>,
    ) -> Result<Vec<SyncedUser>, ApiError> {
        if let Some(users) = self.inner.cache.get(USER_LIST_KEY).await {
            debug!("cache hit for user list");
            return Ok(users.as_ref().clone());
        }

        let users: Vec<SyncedUser> = self
            .inner
            .api
            .get(USERS_PATH, token)
            .await?
            .unwrap_or_default();

        self.inner
            .cache
            .insert(USER_LIST_KEY.to_owned(), Arc::new(users.clone()))
            .await;

        Ok(users)
    }

    /// Upsert the backend record for an identity.
    ///
    /// The backend is keyed by `clerk_id`, so repeating the call with the
    /// same payload is safe. On success the cached user list is invalidated.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails or answers with no
    /// body.
    #[instrument(skip(self, payload, token), fields(identity = %payload.clerk_id))]
    pub async fn sync_user(
        &self,
        payload: &SyncPayload,
        token: Option<&SecretString>,
    ) -> Result<SyncedUser, ApiError> {
        let user: SyncedUser = self
            .inner
            .api
            .post(USERS_PATH, payload, token)
            .await?
            .ok_or(ApiError::EmptyBody)?;

        self.invalidate_users().await;

        Ok(user)
    }

    /// Drop any cached user list; the next read refetches.
    pub async fn invalidate_users(&self) {
        self.inner.cache.invalidate(USER_LIST_KEY).await;
    }
}
