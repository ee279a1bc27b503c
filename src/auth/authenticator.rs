//! The authenticator capability surface.
//!
//! Every scheme implementation exposes the same four capabilities:
//! pre-authentication readiness, pre-authentication, challenge
//! acceptance, and challenge handling. A scheme may be written as a
//! blocking implementation (hashing is CPU-bound and fast) or as an
//! asynchronous one (e.g. credential lookup over IPC); the registry
//! stores both behind [`AuthenticatorHandle`], which bridges between
//! execution modes in both directions.

use crate::auth::challenge::ChallengeEntry;
use crate::auth::credentials::Credential;
use crate::base::error::AuthError;
use crate::http::Request;
use futures::future::BoxFuture;
use std::sync::Arc;

/// A blocking authentication scheme.
pub trait Authenticator: Send + Sync {
    /// True when this authenticator can decorate a request before any
    /// challenge has been seen (e.g. Basic always, Digest while its
    /// session is fresh).
    fn can_pre_authenticate(&self) -> bool;

    /// Mutate the outgoing request's authorization header.
    fn pre_authenticate(
        &self,
        request: &mut Request,
        credential: &Credential,
    ) -> Result<(), AuthError>;

    /// True if this authenticator accepts the given challenge.
    fn can_handle_challenge(&self, challenge: &ChallengeEntry) -> bool;

    /// Absorb a challenge, replacing any internal session state.
    fn handle_challenge(&self, challenge: &ChallengeEntry) -> Result<(), AuthError>;
}

/// An asynchronous authentication scheme.
///
/// The readiness predicates stay synchronous in both variants; only the
/// two mutating operations may suspend.
pub trait AsyncAuthenticator: Send + Sync {
    fn can_pre_authenticate(&self) -> bool;

    fn pre_authenticate<'a>(
        &'a self,
        request: &'a mut Request,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<(), AuthError>>;

    fn can_handle_challenge(&self, challenge: &ChallengeEntry) -> bool;

    fn handle_challenge<'a>(
        &'a self,
        challenge: &'a ChallengeEntry,
    ) -> BoxFuture<'a, Result<(), AuthError>>;
}

/// The registry's common internal representation of an authenticator.
///
/// A blocking authenticator invoked from async code runs inline; an
/// asynchronous authenticator invoked from sync code is driven to
/// completion with `futures::executor::block_on`.
#[derive(Clone)]
pub enum AuthenticatorHandle {
    Blocking(Arc<dyn Authenticator>),
    Async(Arc<dyn AsyncAuthenticator>),
}

impl AuthenticatorHandle {
    pub fn blocking<A: Authenticator + 'static>(authenticator: A) -> Self {
        Self::Blocking(Arc::new(authenticator))
    }

    pub fn asynchronous<A: AsyncAuthenticator + 'static>(authenticator: A) -> Self {
        Self::Async(Arc::new(authenticator))
    }

    pub fn can_pre_authenticate(&self) -> bool {
        match self {
            Self::Blocking(a) => a.can_pre_authenticate(),
            Self::Async(a) => a.can_pre_authenticate(),
        }
    }

    pub fn can_handle_challenge(&self, challenge: &ChallengeEntry) -> bool {
        match self {
            Self::Blocking(a) => a.can_handle_challenge(challenge),
            Self::Async(a) => a.can_handle_challenge(challenge),
        }
    }

    pub async fn pre_authenticate(
        &self,
        request: &mut Request,
        credential: &Credential,
    ) -> Result<(), AuthError> {
        match self {
            Self::Blocking(a) => a.pre_authenticate(request, credential),
            Self::Async(a) => a.pre_authenticate(request, credential).await,
        }
    }

    pub async fn handle_challenge(&self, challenge: &ChallengeEntry) -> Result<(), AuthError> {
        match self {
            Self::Blocking(a) => a.handle_challenge(challenge),
            Self::Async(a) => a.handle_challenge(challenge).await,
        }
    }

    /// Synchronous entry point for callers without a reactor.
    pub fn pre_authenticate_blocking(
        &self,
        request: &mut Request,
        credential: &Credential,
    ) -> Result<(), AuthError> {
        match self {
            Self::Blocking(a) => a.pre_authenticate(request, credential),
            Self::Async(a) => futures::executor::block_on(a.pre_authenticate(request, credential)),
        }
    }

    /// Synchronous entry point for callers without a reactor.
    pub fn handle_challenge_blocking(&self, challenge: &ChallengeEntry) -> Result<(), AuthError> {
        match self {
            Self::Blocking(a) => a.handle_challenge(challenge),
            Self::Async(a) => futures::executor::block_on(a.handle_challenge(challenge)),
        }
    }
}

impl std::fmt::Debug for AuthenticatorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blocking(_) => f.write_str("AuthenticatorHandle::Blocking"),
            Self::Async(_) => f.write_str("AuthenticatorHandle::Async"),
        }
    }
}
