//! Outlay product shell library.
//!
//! The shell owns the client core of the Outlay expense tracker: the JSON
//! HTTP client for the backend, the typed user gateway, and the
//! reconciliation state machine that keeps the identity provider's session
//! and the backend's user records in agreement while gating rendering.
//!
//! Page layout, navigation, and dashboard widgets live elsewhere; they
//! consume the [`reconcile::Gate`] signal, drain the [`notify`] channel for
//! toast-style notices, and reach the backend through [`state::AppState`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod identity;
pub mod notify;
pub mod reconcile;
pub mod state;
