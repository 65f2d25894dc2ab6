//! Wire shapes for the user API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use outlay_core::{Email, IdentityId, UserId};

use crate::error::PreconditionError;
use crate::identity::Identity;

/// Request body for `POST /api/v1/users`.
///
/// Derived deterministically from an [`Identity`] snapshot; the backend
/// upserts by `clerk_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncPayload {
    pub clerk_id: IdentityId,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl SyncPayload {
    /// Build the payload for an identity snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`PreconditionError`] if the identity carries no usable
    /// primary email; such an identity cannot be reconciled.
    pub fn for_identity(identity: &Identity) -> Result<Self, PreconditionError> {
        let email = identity
            .primary_email
            .as_deref()
            .ok_or(PreconditionError::MissingEmail)?;
        let email = Email::parse(email)?;

        Ok(Self {
            clerk_id: identity.id.clone(),
            email,
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            image_url: identity.image_url.clone(),
        })
    }
}

/// A backend user record, as returned by the user API.
///
/// Mirrors the identity attributes plus the backend-internal id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncedUser {
    pub id: UserId,
    pub clerk_id: IdentityId,
    pub email: Email,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
