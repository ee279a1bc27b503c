//! Base types and error handling.
//!
//! Foundational types shared by every layer:
//! - [`AuthError`]: the crate-wide error taxonomy
//! - [`CancelToken`]: cooperative cancellation for the retry loop

pub mod cancel;
pub mod error;

pub use cancel::CancelToken;
pub use error::AuthError;
