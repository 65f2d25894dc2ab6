//! User-sync reconciliation state machine.
//!
//! Observes the identity provider's session snapshots, ensures exactly one
//! backend user record exists for the signed-in identity, and publishes the
//! render gate the application shell consumes.
//!
//! # Guarantees
//!
//! - At most one sync call is in flight at any time; re-evaluations while a
//!   call is outstanding never double-submit.
//! - A synced or errored identity is never re-synced automatically; a
//!   failed sync waits for an explicit [`ReconcilerHandle::retry`].
//! - A completion for an identity that is no longer active frees the
//!   in-flight slot but leaves the new identity's outcome untouched.
//! - An identity without a usable email is signed out exactly once and
//!   never reaches the backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use outlay_shell::reconcile::Reconciler;
//!
//! let handle = Reconciler::new(provider, state.users().clone(), notices).spawn();
//! let mut gate = handle.gate();
//! while gate.changed().await.is_ok() {
//!     let snapshot = *gate.borrow();
//!     if snapshot.error() {
//!         // render the error panel; its button calls handle.retry()
//!     } else if snapshot.ready() {
//!         // render the application content
//!     }
//! }
//! ```

mod driver;
mod machine;

pub use driver::{Reconciler, ReconcilerHandle};
pub use machine::{Gate, Phase};
