//! Retry policy for the authentication loop.
//!
//! The challenge controller never limits itself; a server that keeps
//! challenging would otherwise drive the loop forever. The bound lives
//! here, with the caller.

use crate::auth::registry::HeaderTarget;
use http::StatusCode;

/// Configuration for authentication retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum authentication retries per request (default: 3).
    pub max_attempts: usize,
    /// Statuses beyond 401 treated as origin-server challenges. Some
    /// servers hide Basic endpoints behind 404.
    pub extra_www_statuses: Vec<StatusCode>,
    /// Statuses beyond 407 treated as proxy challenges.
    pub extra_proxy_statuses: Vec<StatusCode>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            extra_www_statuses: Vec::new(),
            extra_proxy_statuses: Vec::new(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries after a challenge.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            ..Default::default()
        }
    }

    /// Which header family a status code challenges, if any.
    pub fn challenge_target(&self, status: StatusCode) -> Option<HeaderTarget> {
        if status == StatusCode::UNAUTHORIZED || self.extra_www_statuses.contains(&status) {
            Some(HeaderTarget::Www)
        } else if status == StatusCode::PROXY_AUTHENTICATION_REQUIRED
            || self.extra_proxy_statuses.contains(&status)
        {
            Some(HeaderTarget::Proxy)
        } else {
            None
        }
    }

    /// Check if another authentication attempt is allowed.
    pub fn should_retry(&self, attempt: usize) -> bool {
        attempt < self.max_attempts
    }
}
