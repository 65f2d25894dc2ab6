//! Scripted in-memory identity provider.

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use secrecy::SecretString;
use tokio::sync::watch;

use outlay_shell::identity::{Identity, IdentityError, IdentityProvider, SessionState};

/// Identity provider backed by a watch channel, driven by the test.
pub struct TestProvider {
    sessions: watch::Sender<SessionState>,
    token: Mutex<Option<SecretString>>,
    sign_outs: AtomicUsize,
}

impl TestProvider {
    /// Create a provider in the `Loading` state.
    #[must_use]
    pub fn new() -> Self {
        let (sessions, _) = watch::channel(SessionState::Loading);
        Self {
            sessions,
            token: Mutex::new(None),
            sign_outs: AtomicUsize::new(0),
        }
    }

    /// Emit a session snapshot.
    ///
    /// `send_replace` updates the value even before anyone subscribes.
    pub fn emit(&self, session: SessionState) {
        let _ = self.sessions.send_replace(session);
    }

    /// Sign an identity in.
    pub fn sign_in(&self, identity: Identity) {
        self.emit(SessionState::SignedIn(identity));
    }

    /// Set the token returned by `session_token`.
    pub fn set_token(&self, token: Option<&str>) {
        *self.token.lock().expect("token lock") =
            token.map(|t| SecretString::from(t.to_string()));
    }

    /// Number of sign-out requests received.
    #[must_use]
    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

impl Default for TestProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for TestProvider {
    fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.sessions.subscribe()
    }

    fn session_token(
        &self,
    ) -> impl Future<Output = Result<Option<SecretString>, IdentityError>> + Send {
        let token = self.token.lock().expect("token lock").clone();
        async move { Ok(token) }
    }

    fn sign_out(&self) -> impl Future<Output = Result<(), IdentityError>> + Send {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        // The hosted provider confirms a sign-out by emitting a signed-out
        // snapshot.
        let _ = self.sessions.send_replace(SessionState::SignedOut);
        async { Ok(()) }
    }
}
