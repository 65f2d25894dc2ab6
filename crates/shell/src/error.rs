//! Unified error handling with Sentry integration.
//!
//! Sync failures never propagate past the reconciler: they are converted to
//! record state plus a notice, and the rendering shell only observes the
//! boolean `error` gate signal.

use thiserror::Error;

use outlay_core::EmailError;

use crate::api::ApiError;
use crate::identity::IdentityError;

/// A locally-detected failure that makes reconciliation impossible.
///
/// Terminal for the session: resolved by forced sign-out, not retryable in
/// place.
#[derive(Debug, Error)]
pub enum PreconditionError {
    /// The identity has no primary email address.
    #[error("identity has no primary email address")]
    MissingEmail,

    /// The identity's primary email failed validation.
    #[error("identity email is invalid: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// Shell-level error type.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A local precondition failed before any backend call.
    #[error("precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    /// A backend call failed.
    #[error("backend error: {0}")]
    Api(#[from] ApiError),

    /// The identity provider failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Set the Sentry user context from a synced user.
///
/// Call this after a successful sync to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
