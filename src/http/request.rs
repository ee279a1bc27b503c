//! Outgoing HTTP request as seen by the authentication core.
//!
//! The transport owns the wire; this type carries everything the
//! authenticators need to read (method, URL, body bytes) and mutate
//! (the authorization headers) across retry attempts.

use crate::base::error::AuthError;
use crate::http::RequestBody;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use url::Url;

/// One logical HTTP request.
///
/// The same `Request` value is resent on every authentication retry;
/// only its headers change between attempts.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: RequestBody,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    /// Convenience constructor parsing the URL.
    pub fn get(url: &str) -> Result<Self, AuthError> {
        let url = Url::parse(url).map_err(|_| AuthError::InvalidHeader)?;
        Ok(Self::new(Method::GET, url))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn set_body<B: Into<RequestBody>>(&mut self, body: B) {
        self.body = body.into();
    }

    /// Set or replace a header. Invalid values are rejected rather than
    /// silently dropped.
    pub fn set_header(&mut self, name: HeaderName, value: &str) -> Result<(), AuthError> {
        let value = HeaderValue::from_str(value).map_err(|_| AuthError::InvalidHeader)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// The request-uri as it appears in a Digest `uri` parameter:
    /// path plus query, no scheme or authority.
    pub fn path_and_query(&self) -> String {
        match self.url.query() {
            Some(q) => format!("{}?{}", self.url.path(), q),
            None => self.url.path().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_and_query_without_query() {
        let req = Request::get("http://example.com/dir/index.html").unwrap();
        assert_eq!(req.path_and_query(), "/dir/index.html");
    }

    #[test]
    fn test_path_and_query_with_query() {
        let req = Request::get("http://example.com/search?q=rust&page=2").unwrap();
        assert_eq!(req.path_and_query(), "/search?q=rust&page=2");
    }

    #[test]
    fn test_root_path() {
        let req = Request::get("http://example.com").unwrap();
        assert_eq!(req.path_and_query(), "/");
    }

    #[test]
    fn test_set_header_replaces() {
        let mut req = Request::get("http://example.com/").unwrap();
        req.set_header(http::header::AUTHORIZATION, "Basic Zm9v").unwrap();
        req.set_header(http::header::AUTHORIZATION, "Basic YmFy").unwrap();
        let values: Vec<_> = req.headers().get_all(http::header::AUTHORIZATION).iter().collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0], "Basic YmFy");
    }

    #[test]
    fn test_set_header_rejects_invalid_value() {
        let mut req = Request::get("http://example.com/").unwrap();
        let result = req.set_header(http::header::AUTHORIZATION, "bad\nvalue");
        assert_eq!(result, Err(AuthError::InvalidHeader));
    }
}
