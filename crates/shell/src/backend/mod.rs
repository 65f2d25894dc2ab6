//! Typed gateway to the backend user API.
//!
//! Defines the wire shapes for `GET`/`POST /api/v1/users` and the cached
//! [`UserGateway`] operations built atop the [`crate::api::ApiClient`].

mod types;
mod users;

pub use types::{SyncPayload, SyncedUser};
pub use users::UserGateway;
