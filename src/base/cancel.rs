//! Cooperative cancellation for in-flight requests.

use crate::base::error::AuthError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cancellation signal shared between a caller and the retry loop.
///
/// The loop checks the token at each suspension point (before every send
/// and before every challenge-handling step). Cancellation does not roll
/// back header mutations already applied to the request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Error out if cancellation has been signalled.
    pub fn check(&self) -> Result<(), AuthError> {
        if self.is_cancelled() {
            Err(AuthError::Cancelled)
        } else {
            Ok(())
        }
    }
}
