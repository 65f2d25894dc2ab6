//! Reconciler driver task and handle.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use outlay_core::IdentityId;

use crate::backend::{SyncPayload, SyncedUser, UserGateway};
use crate::error::{self, PreconditionError, ShellError};
use crate::identity::{IdentityProvider, SessionState};
use crate::notify::NoticeSink;

use super::machine::{self, Decision, Gate, ReconciliationRecord};

/// Notice shown when a sync attempt fails.
const SYNC_FAILED_NOTICE: &str = "Failed to initialize your account. Please try again.";

/// Notice shown when the identity carries no usable email.
const NO_EMAIL_NOTICE: &str =
    "Account error: no email address found. Please sign in with a valid email.";

/// Outcome of a spawned sync call, tagged with the identity it was issued
/// for.
struct SyncOutcome {
    identity_id: IdentityId,
    result: Result<SyncedUser, ShellError>,
}

/// Commands accepted by a running reconciler.
enum Command {
    Retry,
    Shutdown,
}

/// Handle to a running reconciler.
///
/// The rendering shell holds this: it observes the gate, can request a
/// retry after a failed sync, and shuts the driver down on teardown.
pub struct ReconcilerHandle {
    gate_rx: watch::Receiver<Gate>,
    command_tx: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl ReconcilerHandle {
    /// Subscribe to gate updates.
    #[must_use]
    pub fn gate(&self) -> watch::Receiver<Gate> {
        self.gate_rx.clone()
    }

    /// The most recently published gate value.
    #[must_use]
    pub fn current(&self) -> Gate {
        *self.gate_rx.borrow()
    }

    /// Request a retry of a failed sync.
    ///
    /// A no-op while a sync is in flight or when nothing has failed.
    pub fn retry(&self) {
        let _ = self.command_tx.send(Command::Retry);
    }

    /// Stop the reconciler and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.command_tx.send(Command::Shutdown);
        let _ = self.task.await;
    }
}

/// The reconciliation state machine.
///
/// Owns the reconciliation record for the life of the process; everything
/// else observes the published gate.
pub struct Reconciler<P> {
    provider: Arc<P>,
    gateway: UserGateway,
    notices: NoticeSink,
}

impl<P: IdentityProvider> Reconciler<P> {
    /// Create a reconciler over a provider and gateway.
    #[must_use]
    pub fn new(provider: Arc<P>, gateway: UserGateway, notices: NoticeSink) -> Self {
        Self {
            provider,
            gateway,
            notices,
        }
    }

    /// Spawn the driver task and return its handle.
    ///
    /// The task runs until [`ReconcilerHandle::shutdown`] is called or the
    /// provider drops its session channel.
    #[must_use]
    pub fn spawn(self) -> ReconcilerHandle {
        let (gate_tx, gate_rx) = watch::channel(Gate::initial());
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let driver = Driver {
            sessions: self.provider.subscribe(),
            provider: self.provider,
            gateway: self.gateway,
            notices: self.notices,
            gate_tx,
            command_rx,
            outcome_tx,
            outcome_rx,
            record: ReconciliationRecord::default(),
            sign_out_pending: None,
        };

        let task = tokio::spawn(driver.run());

        ReconcilerHandle {
            gate_rx,
            command_tx,
            task,
        }
    }
}

struct Driver<P> {
    provider: Arc<P>,
    gateway: UserGateway,
    notices: NoticeSink,
    sessions: watch::Receiver<SessionState>,
    gate_tx: watch::Sender<Gate>,
    command_rx: mpsc::UnboundedReceiver<Command>,
    outcome_tx: mpsc::UnboundedSender<SyncOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<SyncOutcome>,
    record: ReconciliationRecord,
    /// Identity a forced sign-out has been requested for, until the
    /// provider confirms it.
    sign_out_pending: Option<IdentityId>,
}

impl<P: IdentityProvider> Driver<P> {
    async fn run(mut self) {
        info!("reconciler started");
        self.step().await;

        loop {
            tokio::select! {
                changed = self.sessions.changed() => {
                    if changed.is_err() {
                        debug!("session channel closed");
                        break;
                    }
                    self.on_session_change();
                }
                Some(command) = self.command_rx.recv() => {
                    match command {
                        Command::Retry => self.on_retry(),
                        Command::Shutdown => break,
                    }
                }
                Some(outcome) = self.outcome_rx.recv() => {
                    self.on_outcome(outcome);
                }
            }

            self.step().await;
        }

        info!("reconciler stopped");
    }

    /// Evaluate the current snapshot, run the decided action, republish the
    /// gate.
    async fn step(&mut self) {
        let session = self.sessions.borrow().clone();

        match machine::decide(&session, &self.record, self.sign_out_pending.as_ref()) {
            Decision::Hold => {}
            Decision::Sync(payload) => self.start_sync(payload),
            Decision::SignOut {
                identity_id,
                reason,
            } => self.force_sign_out(identity_id, &reason).await,
        }

        let gate = machine::project(&session, &self.record);
        self.gate_tx.send_if_modified(|current| {
            if *current == gate {
                false
            } else {
                *current = gate;
                true
            }
        });
    }

    fn on_session_change(&mut self) {
        let session = self.sessions.borrow().clone();

        // A confirmed sign-out or an identity switch ends any pending
        // forced sign-out; signing out also ends the Sentry association.
        match session.identity() {
            None => {
                self.sign_out_pending = None;
                if session.loaded() {
                    error::clear_sentry_user();
                }
            }
            Some(identity) => {
                if self
                    .sign_out_pending
                    .as_ref()
                    .is_some_and(|pending| *pending != identity.id)
                {
                    self.sign_out_pending = None;
                }
            }
        }
    }

    /// Issue exactly one sync for the active identity.
    fn start_sync(&mut self, payload: SyncPayload) {
        let identity_id = payload.clerk_id.clone();
        self.record.begin();
        info!(identity = %identity_id, "starting user sync");

        let provider = Arc::clone(&self.provider);
        let gateway = self.gateway.clone();
        let outcome_tx = self.outcome_tx.clone();

        tokio::spawn(async move {
            let result = match provider.session_token().await {
                Ok(token) => gateway
                    .sync_user(&payload, token.as_ref())
                    .await
                    .map_err(ShellError::from),
                Err(e) => Err(ShellError::from(e)),
            };

            let _ = outcome_tx.send(SyncOutcome {
                identity_id,
                result,
            });
        });
    }

    /// Apply a sync outcome, ignoring completions for identities that are no
    /// longer active.
    fn on_outcome(&mut self, outcome: SyncOutcome) {
        self.record.finish();

        let session = self.sessions.borrow().clone();
        if session.identity().map(|identity| &identity.id) != Some(&outcome.identity_id) {
            debug!(
                identity = %outcome.identity_id,
                "ignoring sync completion for inactive identity"
            );
            return;
        }

        match outcome.result {
            Ok(user) => {
                self.record.record_success(&outcome.identity_id);
                error::set_sentry_user(&user.id, Some(user.email.as_str()));
                info!(identity = %outcome.identity_id, user = %user.id, "user synced");
            }
            Err(e) => {
                self.record.record_failure(&outcome.identity_id);
                error!(identity = %outcome.identity_id, error = %e, "user sync failed");
                self.notices.error(SYNC_FAILED_NOTICE);
            }
        }
    }

    /// Clear recorded outcomes for the active identity so the sync rule
    /// re-runs.
    fn on_retry(&mut self) {
        if self.record.in_flight() {
            warn!("retry ignored while a sync is in flight");
            return;
        }

        let session = self.sessions.borrow().clone();
        if let Some(identity) = session.identity() {
            info!(identity = %identity.id, "retrying user sync");
            self.record.clear(&identity.id);
        }
    }

    /// The identity cannot be reconciled; sign it out once and notify.
    async fn force_sign_out(&mut self, identity_id: IdentityId, reason: &PreconditionError) {
        error!(identity = %identity_id, error = %reason, "identity unusable, forcing sign-out");
        self.notices.error(NO_EMAIL_NOTICE);
        self.sign_out_pending = Some(identity_id);

        if let Err(e) = self.provider.sign_out().await {
            error!(error = %e, "sign-out request failed");
        }
    }
}
