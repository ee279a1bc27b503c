//! # authnet
//!
//! HTTP authentication for Rust HTTP clients.
//!
//! `authnet` implements the client side of HTTP authentication: parsing
//! `WWW-Authenticate`/`Proxy-Authenticate` challenges, computing
//! RFC 2617 Digest responses, and orchestrating the 401/407 retry
//! protocol across a pluggable set of authenticators ranked by security
//! level. The wire transport stays outside the crate, behind the
//! [`Transport`](crate::http::transport::Transport) trait.
//!
//! ## Features
//!
//! - **Challenge parsing**: tolerant single-pass RFC 7235 parser,
//!   multi-scheme headers, quoted commas, escaped quotes, raw-text
//!   preservation
//! - **Digest (RFC 2617)**: MD5/MD5-sess, qop auth/auth-int, monotonic
//!   nonce counting safe under concurrency, session expiry
//! - **Basic (RFC 7617)**: pre-authentication and challenge response
//! - **Scheme registry**: security-level ranking, last-write-wins
//!   registration, candidate fallthrough on malformed challenges
//! - **Retry orchestration**: bounded loop, proxy and origin families,
//!   cancellation, sync and async entry points
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use authnet::{AuthenticatorHandle, Client, Credential, DigestAuthenticator, Request, StaticCredentials};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Client::builder(transport)
//!         .credentials(StaticCredentials::new(Credential::new("user", "pass")))
//!         .authenticator("Digest", AuthenticatorHandle::blocking(DigestAuthenticator::new()), 20)
//!         .build();
//!     let response = client.get("https://example.com/private").await.unwrap();
//!     println!("Status: {}", response.status());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Core types: errors and cancellation
//! - [`auth`] - Challenge parsing, Digest/Basic engines, registry
//! - [`http`] - Request/response messages and the transport seam
//! - [`client`] - The retry orchestrator and builder surface

pub mod auth;
pub mod base;
pub mod client;
pub mod http;

pub use auth::{
    parse_challenges, AsyncAuthenticator, Authenticator, AuthenticatorHandle,
    AuthenticatorRegistry, BasicAuthenticator, ChallengeEntry, Credential, CredentialCache,
    CredentialProvider, DigestAuthenticator, DigestSession, HeaderTarget, ParamList, RetryPolicy,
    StaticCredentials,
};
pub use base::{AuthError, CancelToken};
pub use client::{Client, ClientBuilder};
pub use http::{Request, RequestBody, Response, Transport};
