//! HTTP client with builder pattern.
//!
//! Owns the retry orchestration around an external transport: send,
//! inspect a non-success response, let the registered authenticators
//! answer the challenge, and resend the same logical request with new
//! authorization headers.
//!
//! # Example
//!
//! ```rust,ignore
//! use authnet::{AuthenticatorHandle, Client, Credential, DigestAuthenticator, StaticCredentials};
//!
//! let client = Client::builder(transport)
//!     .credentials(StaticCredentials::new(Credential::new("user", "pass")))
//!     .authenticator("Digest", AuthenticatorHandle::blocking(DigestAuthenticator::new()), 20)
//!     .build();
//!
//! let response = client.execute(Request::get("https://example.com/private")?).await?;
//! ```

use crate::auth::authenticator::AuthenticatorHandle;
use crate::auth::credentials::{CredentialCache, CredentialProvider};
use crate::auth::registry::{AuthController, HeaderTarget};
use crate::auth::retry::RetryPolicy;
use crate::base::cancel::CancelToken;
use crate::base::error::AuthError;
use crate::http::{Request, Response, Transport};
use std::sync::Arc;

/// HTTP client for making authenticated requests.
///
/// Use [`Client::builder()`] to configure and create a client. The
/// client is cheap to share behind an `Arc`; concurrent requests may
/// share its authenticators (and therefore their sessions).
pub struct Client {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
    www: AuthController,
    proxy: AuthController,
    policy: RetryPolicy,
    ignore_status: bool,
}

impl Client {
    /// Create a client builder around a transport.
    pub fn builder<T: Transport + 'static>(transport: T) -> ClientBuilder {
        ClientBuilder::new(transport)
    }

    /// Execute a request through the authentication retry loop.
    pub async fn execute(&self, request: Request) -> Result<Response, AuthError> {
        self.execute_with_cancel(request, &CancelToken::new()).await
    }

    /// Execute with a cancellation token, checked before each send and
    /// before each challenge-handling step.
    pub async fn execute_with_cancel(
        &self,
        mut request: Request,
        cancel: &CancelToken,
    ) -> Result<Response, AuthError> {
        // Apply pre-authentication for both header families before the
        // first send.
        self.www
            .pre_authenticate(&mut request, &*self.credentials)
            .await?;
        self.proxy
            .pre_authenticate(&mut request, &*self.credentials)
            .await?;

        let mut attempts: usize = 0;
        loop {
            cancel.check()?;
            let response = self.transport.send(&request).await?;

            if response.is_success() || self.ignore_status {
                return Ok(response);
            }

            let Some(target) = self.policy.challenge_target(response.status()) else {
                // Not a challenge status (e.g. 500): surface unchanged.
                return response.ensure_success();
            };

            if !self.policy.should_retry(attempts) {
                tracing::debug!(
                    status = %response.status(),
                    attempts,
                    "authentication attempts exhausted"
                );
                return response.ensure_success();
            }

            cancel.check()?;
            let controller = match target {
                HeaderTarget::Www => &self.www,
                HeaderTarget::Proxy => &self.proxy,
            };
            let handled = controller
                .handle_response(&response, &mut request, &*self.credentials)
                .await?;
            if !handled {
                // No registered authenticator accepted the challenge:
                // terminal failure, no further retries.
                return response.ensure_success();
            }

            attempts += 1;
            tracing::debug!(status = %response.status(), attempt = attempts, "retrying with credentials");
            // The failed attempt's response is released before the
            // resend; the request goes out again with its new headers.
            drop(response);
        }
    }

    /// Synchronous equivalent of [`Client::execute`], for callers
    /// without an async runtime.
    pub fn execute_blocking(&self, request: Request) -> Result<Response, AuthError> {
        futures::executor::block_on(self.execute(request))
    }

    /// Convenience: execute a GET against a URL string.
    pub async fn get(&self, url: &str) -> Result<Response, AuthError> {
        self.execute(Request::get(url)?).await
    }

    /// The origin-server (401) challenge controller.
    pub fn www_controller(&self) -> &AuthController {
        &self.www
    }

    /// The proxy (407) challenge controller.
    pub fn proxy_controller(&self) -> &AuthController {
        &self.proxy
    }
}

/// Builder for creating a [`Client`].
pub struct ClientBuilder {
    transport: Arc<dyn Transport>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    www: AuthController,
    proxy: AuthController,
    policy: RetryPolicy,
    ignore_status: bool,
}

impl ClientBuilder {
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            credentials: None,
            www: AuthController::new(HeaderTarget::Www),
            proxy: AuthController::new(HeaderTarget::Proxy),
            policy: RetryPolicy::default(),
            ignore_status: false,
        }
    }

    /// Set the credential source.
    pub fn credentials<P: CredentialProvider + 'static>(mut self, provider: P) -> Self {
        self.credentials = Some(Arc::new(provider));
        self
    }

    /// Register an authenticator for origin-server challenges.
    /// Registering a scheme twice replaces the earlier registration.
    pub fn authenticator(
        mut self,
        scheme: impl Into<String>,
        handle: AuthenticatorHandle,
        security_level: i32,
    ) -> Self {
        self.www
            .registry_mut()
            .register(scheme, handle, security_level);
        self
    }

    /// Register an authenticator for proxy challenges.
    pub fn proxy_authenticator(
        mut self,
        scheme: impl Into<String>,
        handle: AuthenticatorHandle,
        security_level: i32,
    ) -> Self {
        self.proxy
            .registry_mut()
            .register(scheme, handle, security_level);
        self
    }

    /// Set the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Return non-success responses to the caller instead of running
    /// the challenge loop or raising a status error.
    pub fn ignore_status(mut self, ignore: bool) -> Self {
        self.ignore_status = ignore;
        self
    }

    /// Build the client.
    pub fn build(self) -> Client {
        Client {
            transport: self.transport,
            credentials: self
                .credentials
                .unwrap_or_else(|| Arc::new(CredentialCache::new())),
            www: self.www,
            proxy: self.proxy,
            policy: self.policy,
            ignore_status: self.ignore_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::basic::BasicAuthenticator;
    use crate::auth::credentials::{Credential, StaticCredentials};
    use crate::auth::digest::DigestAuthenticator;
    use bytes::Bytes;
    use futures::future::BoxFuture;
    use http::header::{AUTHORIZATION, PROXY_AUTHENTICATE, WWW_AUTHENTICATE};
    use http::{HeaderMap, StatusCode};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport scripted with a fixed sequence of responses. Records
    /// every request it was asked to send.
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Response>>,
        seen: Mutex<Vec<Request>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Response>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<Request> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn send<'a>(
            &'a self,
            request: &'a Request,
        ) -> BoxFuture<'a, Result<Response, AuthError>> {
            Box::pin(async move {
                self.seen.lock().unwrap().push(request.clone());
                self.responses
                    .lock()
                    .unwrap()
                    .pop_front()
                    .ok_or_else(|| AuthError::Transport("no scripted response".to_string()))
            })
        }
    }

    /// Keeps a handle on the scripted transport after the client takes
    /// ownership of the `Transport` impl.
    struct SharedTransport(Arc<ScriptedTransport>);

    impl Transport for SharedTransport {
        fn send<'a>(
            &'a self,
            request: &'a Request,
        ) -> BoxFuture<'a, Result<Response, AuthError>> {
            self.0.send(request)
        }
    }

    fn challenge_401(header: &str) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(WWW_AUTHENTICATE, header.parse().unwrap());
        Response::new(StatusCode::UNAUTHORIZED, headers, Bytes::new())
    }

    fn ok_200() -> Response {
        Response::new(StatusCode::OK, HeaderMap::new(), Bytes::from("ok"))
    }

    fn digest_client(transport: &Arc<ScriptedTransport>) -> (Client, Arc<DigestAuthenticator>) {
        let digest = Arc::new(DigestAuthenticator::new());
        let client = Client::builder(SharedTransport(transport.clone()))
            .credentials(StaticCredentials::new(Credential::new("u", "p")))
            .authenticator("Digest", AuthenticatorHandle::Blocking(digest.clone()), 20)
            .build();
        (client, digest)
    }

    #[tokio::test]
    async fn test_digest_challenge_then_success() {
        let transport = ScriptedTransport::new(vec![
            challenge_401(r#"Digest realm="test", nonce="abc123", qop="auth""#),
            ok_200(),
        ]);
        let (client, digest) = digest_client(&transport);

        let response = client
            .execute(Request::get("http://example.com/path").unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(digest.challenges_handled(), 1);

        let sent = transport.requests();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].headers().get(AUTHORIZATION).is_none());
        let auth = sent[1]
            .headers()
            .get(AUTHORIZATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(auth.starts_with("Digest username=\"u\""));
        assert!(auth.contains("realm=\"test\""));
        assert!(auth.contains("nonce=\"abc123\""));
        assert!(auth.contains("uri=\"/path\""));
        assert!(auth.contains("nc=00000001"));
        assert!(auth.contains("qop=auth"));
        assert!(auth.contains("response=\""));
    }

    #[tokio::test]
    async fn test_unregistered_scheme_surfaces_terminally() {
        let transport = ScriptedTransport::new(vec![challenge_401("Negotiate realm=\"x\"")]);
        let (client, _) = digest_client(&transport);

        let err = client
            .execute(Request::get("http://example.com/").unwrap())
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::HttpStatus(StatusCode::UNAUTHORIZED));
        // Exactly one send: no candidate, no retry.
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_perpetual_challenge_is_bounded() {
        let responses: Vec<Response> = (0..10)
            .map(|i| challenge_401(&format!(r#"Digest realm="r", nonce="n{}", qop="auth""#, i)))
            .collect();
        let transport = ScriptedTransport::new(responses);
        let (client, _) = digest_client(&transport);

        let err = client
            .execute(Request::get("http://example.com/").unwrap())
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::HttpStatus(StatusCode::UNAUTHORIZED));
        // Initial send plus RetryPolicy::default().max_attempts retries.
        assert_eq!(transport.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_ignore_status_returns_response_unprocessed() {
        let transport = ScriptedTransport::new(vec![challenge_401(
            r#"Digest realm="r", nonce="n", qop="auth""#,
        )]);
        let digest = Arc::new(DigestAuthenticator::new());
        let client = Client::builder(SharedTransport(transport.clone()))
            .credentials(StaticCredentials::new(Credential::new("u", "p")))
            .authenticator("Digest", AuthenticatorHandle::Blocking(digest.clone()), 20)
            .ignore_status(true)
            .build();

        let response = client
            .execute(Request::get("http://example.com/").unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(digest.challenges_handled(), 0);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_basic_pre_authentication() {
        let transport = ScriptedTransport::new(vec![ok_200()]);
        let client = Client::builder(SharedTransport(transport.clone()))
            .credentials(StaticCredentials::new(Credential::new("user", "pass")))
            .authenticator(
                "Basic",
                AuthenticatorHandle::blocking(BasicAuthenticator::new()),
                10,
            )
            .build();

        client
            .execute(Request::get("http://example.com/").unwrap())
            .await
            .unwrap();

        // Basic is always ready: the very first send is authenticated.
        let sent = transport.requests();
        assert_eq!(
            sent[0].headers().get(AUTHORIZATION).unwrap(),
            "Basic dXNlcjpwYXNz"
        );
    }

    #[tokio::test]
    async fn test_security_level_prefers_digest_over_basic() {
        let transport = ScriptedTransport::new(vec![
            challenge_401(r#"Basic realm="r", Digest realm="r", nonce="n", qop="auth""#),
            ok_200(),
        ]);
        let digest = Arc::new(DigestAuthenticator::new());
        let client = Client::builder(SharedTransport(transport.clone()))
            .credentials(StaticCredentials::new(Credential::new("u", "p")))
            .authenticator(
                "Basic",
                AuthenticatorHandle::blocking(BasicAuthenticator::new()),
                10,
            )
            .authenticator("Digest", AuthenticatorHandle::Blocking(digest.clone()), 20)
            .build();

        client
            .execute(Request::get("http://example.com/").unwrap())
            .await
            .unwrap();

        let sent = transport.requests();
        let auth = sent[1]
            .headers()
            .get(AUTHORIZATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(auth.starts_with("Digest "));
        assert_eq!(digest.challenges_handled(), 1);
    }

    #[tokio::test]
    async fn test_digest_falls_through_to_basic_on_bad_challenge() {
        // The Digest challenge is missing its nonce, so the higher
        // ranked candidate rejects it and Basic answers instead.
        let transport = ScriptedTransport::new(vec![
            challenge_401(r#"Basic realm="r", Digest realm="r""#),
            ok_200(),
        ]);
        let client = Client::builder(SharedTransport(transport.clone()))
            .credentials(StaticCredentials::new(Credential::new("u", "p")))
            .authenticator(
                "Basic",
                AuthenticatorHandle::blocking(BasicAuthenticator::new()),
                10,
            )
            .authenticator(
                "Digest",
                AuthenticatorHandle::blocking(DigestAuthenticator::new()),
                20,
            )
            .build();

        let response = client
            .execute(Request::get("http://example.com/").unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let sent = transport.requests();
        let auth = sent[1]
            .headers()
            .get(AUTHORIZATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(auth.starts_with("Basic "));
    }

    #[tokio::test]
    async fn test_proxy_challenge_uses_proxy_family() {
        let mut headers = HeaderMap::new();
        headers.insert(PROXY_AUTHENTICATE, "Basic realm=\"proxy\"".parse().unwrap());
        let proxy_407 = Response::new(
            StatusCode::PROXY_AUTHENTICATION_REQUIRED,
            headers,
            Bytes::new(),
        );

        let transport = ScriptedTransport::new(vec![proxy_407, ok_200()]);
        let client = Client::builder(SharedTransport(transport.clone()))
            .credentials(StaticCredentials::new(Credential::new("u", "p")))
            .proxy_authenticator(
                "Basic",
                AuthenticatorHandle::blocking(BasicAuthenticator::for_target(HeaderTarget::Proxy)),
                10,
            )
            .build();

        client
            .execute(Request::get("http://example.com/").unwrap())
            .await
            .unwrap();

        let sent = transport.requests();
        assert!(sent[1]
            .headers()
            .get(http::header::PROXY_AUTHORIZATION)
            .is_some());
    }

    #[tokio::test]
    async fn test_cancelled_before_send() {
        let transport = ScriptedTransport::new(vec![ok_200()]);
        let (client, _) = digest_client(&transport);

        let cancel = CancelToken::new();
        cancel.cancel();

        let err = client
            .execute_with_cancel(Request::get("http://example.com/").unwrap(), &cancel)
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::Cancelled);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_execute_blocking_without_runtime() {
        let transport = ScriptedTransport::new(vec![
            challenge_401(r#"Digest realm="r", nonce="n", qop="auth""#),
            ok_200(),
        ]);
        let (client, digest) = digest_client(&transport);

        let response = client
            .execute_blocking(Request::get("http://example.com/").unwrap())
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(digest.challenges_handled(), 1);
    }

    #[tokio::test]
    async fn test_non_challenge_error_propagates_unchanged() {
        let transport = ScriptedTransport::new(vec![Response::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            HeaderMap::new(),
            Bytes::new(),
        )]);
        let (client, digest) = digest_client(&transport);

        let err = client
            .execute(Request::get("http://example.com/").unwrap())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AuthError::HttpStatus(StatusCode::INTERNAL_SERVER_ERROR)
        );
        assert_eq!(digest.challenges_handled(), 0);
        assert_eq!(transport.requests().len(), 1);
    }
}
