//! Identity provider seam.
//!
//! Authentication lives in an external hosted identity provider. The shell
//! treats it as an opaque capability: it observes pushed session snapshots,
//! asks for the current session token, and can request a sign-out. The
//! provider's own protocol (OAuth, session cookies, ...) never leaks in.

use std::future::Future;

use secrecy::SecretString;
use thiserror::Error;
use tokio::sync::watch;

use outlay_core::IdentityId;

/// The authenticated user's attributes as reported by the provider.
///
/// An immutable snapshot. The provider may re-emit with edited profile
/// fields, but `id` is stable for the life of a signed-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: IdentityId,
    pub primary_email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
}

/// A snapshot of the provider's session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// The provider has not finished loading session state.
    #[default]
    Loading,
    /// Session state is loaded and nobody is signed in.
    SignedOut,
    /// Session state is loaded and an identity is signed in.
    SignedIn(Identity),
}

impl SessionState {
    /// Whether the provider has finished loading session state.
    #[must_use]
    pub const fn loaded(&self) -> bool {
        !matches!(self, Self::Loading)
    }

    /// Whether an identity is signed in.
    #[must_use]
    pub const fn signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }

    /// The signed-in identity, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Errors reported by the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider rejected or failed the operation.
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Opaque capability exposed by the external identity provider.
///
/// Session updates are push-based: [`subscribe`](Self::subscribe) hands out
/// a watch receiver that always holds the latest [`SessionState`] snapshot.
/// Token retrieval and sign-out are asynchronous calls into the provider.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Subscribe to session snapshots.
    fn subscribe(&self) -> watch::Receiver<SessionState>;

    /// Current session token for backend calls, if one is available.
    fn session_token(
        &self,
    ) -> impl Future<Output = Result<Option<SecretString>, IdentityError>> + Send;

    /// Sign the current identity out.
    fn sign_out(&self) -> impl Future<Output = Result<(), IdentityError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: &str) -> Identity {
        Identity {
            id: IdentityId::new(id),
            primary_email: Some("a@b.com".to_string()),
            first_name: None,
            last_name: None,
            image_url: None,
        }
    }

    #[test]
    fn test_session_state_accessors() {
        assert!(!SessionState::Loading.loaded());
        assert!(!SessionState::Loading.signed_in());

        assert!(SessionState::SignedOut.loaded());
        assert!(!SessionState::SignedOut.signed_in());

        let signed_in = SessionState::SignedIn(identity("u1"));
        assert!(signed_in.loaded());
        assert!(signed_in.signed_in());
        assert_eq!(
            signed_in.identity().map(|i| i.id.as_str()),
            Some("u1")
        );
    }
}
