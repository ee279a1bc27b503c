//! HTTP response as returned by the transport.

use crate::base::error::AuthError;
use bytes::Bytes;
use http::header::HeaderName;
use http::{HeaderMap, StatusCode};

/// A received response: status, headers, and the (already drained) body.
///
/// The transport drains the body before handing the response over, so a
/// failed attempt holds no open wire resources once this value is
/// dropped.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// All values of a header, in order. A header may appear on several
    /// lines (servers commonly split WWW-Authenticate per scheme).
    pub fn header_values<'a>(&'a self, name: &HeaderName) -> impl Iterator<Item = &'a str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume the body as UTF-8 text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Fail with the status code when the response is not a success.
    pub fn ensure_success(self) -> Result<Self, AuthError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AuthError::HttpStatus(self.status))
        }
    }
}
