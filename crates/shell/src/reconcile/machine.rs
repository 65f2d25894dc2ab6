//! Reconciliation record and transition rules.
//!
//! The pure half of the state machine: deciding what to do for a session
//! snapshot, and projecting the render gate. All I/O lives in the driver.

use outlay_core::IdentityId;

use crate::backend::SyncPayload;
use crate::error::PreconditionError;
use crate::identity::SessionState;

/// Application phase derived from the session snapshot and the record.
///
/// A discriminated union instead of independent booleans, so invalid
/// combinations cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Session state or a sync outcome is still pending.
    Loading,
    /// Nobody is signed in; no backend record is needed.
    Unauthenticated,
    /// The active identity has a backend record.
    Synced,
    /// The last sync attempt for the active identity failed.
    Errored,
}

/// The render-gate signal consumed by the rendering shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    pub phase: Phase,
    pub signed_in: bool,
    pub syncing: bool,
}

impl Gate {
    /// Initial gate value, before the first session snapshot.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            phase: Phase::Loading,
            signed_in: false,
            syncing: false,
        }
    }

    /// Whether the application shell may render.
    ///
    /// Every phase except `Loading` renders: `Unauthenticated` shows the
    /// signed-out experience and `Errored` shows an error panel with a
    /// retry action.
    #[must_use]
    pub const fn ready(&self) -> bool {
        !matches!(self.phase, Phase::Loading)
    }

    /// Whether the error panel should render.
    #[must_use]
    pub const fn error(&self) -> bool {
        matches!(self.phase, Phase::Errored)
    }
}

/// Per-process sync bookkeeping; one record per shell lifetime.
///
/// Owned exclusively by the reconciler. A given identity id is either
/// synced, errored, or unresolved - never two at once. `in_flight` is the
/// single-slot lock that keeps re-evaluations from double-submitting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationRecord {
    last_synced: Option<IdentityId>,
    last_error: Option<IdentityId>,
    in_flight: bool,
}

impl ReconciliationRecord {
    pub(crate) fn is_synced(&self, id: &IdentityId) -> bool {
        self.last_synced.as_ref() == Some(id)
    }

    pub(crate) fn is_errored(&self, id: &IdentityId) -> bool {
        self.last_error.as_ref() == Some(id)
    }

    pub(crate) const fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Claim the single in-flight slot.
    pub(crate) fn begin(&mut self) {
        debug_assert!(!self.in_flight, "sync already in flight");
        self.in_flight = true;
    }

    /// Release the in-flight slot without recording an outcome.
    pub(crate) const fn finish(&mut self) {
        self.in_flight = false;
    }

    /// Record a successful sync for `id`.
    pub(crate) fn record_success(&mut self, id: &IdentityId) {
        if self.last_error.as_ref() == Some(id) {
            self.last_error = None;
        }
        self.last_synced = Some(id.clone());
    }

    /// Record a failed sync for `id`.
    pub(crate) fn record_failure(&mut self, id: &IdentityId) {
        if self.last_synced.as_ref() == Some(id) {
            self.last_synced = None;
        }
        self.last_error = Some(id.clone());
    }

    /// Forget both outcomes for `id` so the next evaluation re-attempts.
    pub(crate) fn clear(&mut self, id: &IdentityId) {
        if self.last_synced.as_ref() == Some(id) {
            self.last_synced = None;
        }
        if self.last_error.as_ref() == Some(id) {
            self.last_error = None;
        }
    }
}

/// What the reconciler should do after evaluating a snapshot.
#[derive(Debug)]
pub(crate) enum Decision {
    /// Nothing to do.
    Hold,
    /// Issue exactly one sync for the active identity.
    Sync(SyncPayload),
    /// The identity is unusable; force a sign-out.
    SignOut {
        identity_id: IdentityId,
        reason: PreconditionError,
    },
}

/// Decide the next action for a session snapshot.
///
/// `sign_out_pending` is the identity a forced sign-out has already been
/// requested for; the sync rule must not fire again for it while the
/// provider catches up.
pub(crate) fn decide(
    session: &SessionState,
    record: &ReconciliationRecord,
    sign_out_pending: Option<&IdentityId>,
) -> Decision {
    let Some(identity) = session.identity() else {
        return Decision::Hold;
    };

    if record.in_flight()
        || record.is_errored(&identity.id)
        || record.is_synced(&identity.id)
        || sign_out_pending == Some(&identity.id)
    {
        return Decision::Hold;
    }

    match SyncPayload::for_identity(identity) {
        Ok(payload) => Decision::Sync(payload),
        Err(reason) => Decision::SignOut {
            identity_id: identity.id.clone(),
            reason,
        },
    }
}

/// Project the render gate from a session snapshot and the record.
pub(crate) fn project(session: &SessionState, record: &ReconciliationRecord) -> Gate {
    match session {
        SessionState::Loading => Gate {
            phase: Phase::Loading,
            signed_in: false,
            syncing: false,
        },
        SessionState::SignedOut => Gate {
            phase: Phase::Unauthenticated,
            signed_in: false,
            syncing: false,
        },
        SessionState::SignedIn(identity) => {
            // An error recorded for the active identity wins over an
            // in-flight call issued for a previous identity.
            let phase = if record.is_errored(&identity.id) {
                Phase::Errored
            } else if record.is_synced(&identity.id) && !record.in_flight() {
                Phase::Synced
            } else {
                Phase::Loading
            };

            Gate {
                phase,
                signed_in: true,
                syncing: record.in_flight(),
            }
        }
    }
}
