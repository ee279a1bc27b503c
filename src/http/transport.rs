//! The transport seam.
//!
//! Sending bytes on the wire is not this crate's business. The retry
//! orchestrator drives any implementation of [`Transport`]: an HTTP
//! client, a proxy tunnel, or an in-memory fake in tests.

use crate::base::error::AuthError;
use crate::http::{Request, Response};
use futures::future::BoxFuture;

/// An outbound HTTP transport: send a prepared request, get back a
/// response with headers and a status code.
///
/// Implementations must be safe to call from concurrent requests. The
/// returned response has its body drained; dropping it releases the
/// attempt's resources.
pub trait Transport: Send + Sync {
    fn send<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Response, AuthError>>;
}
