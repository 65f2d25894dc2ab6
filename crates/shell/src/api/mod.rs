//! JSON HTTP client for the Outlay backend.
//!
//! Every backend call goes through [`ApiClient`]: JSON bodies, optional
//! bearer tokens, and uniform error translation. Retries, when wanted, are
//! the caller's responsibility.

mod client;
mod error;

pub use client::ApiClient;
pub use error::ApiError;
