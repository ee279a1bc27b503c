//! Authenticator registry and per-header challenge orchestration.
//!
//! A client keeps two independent controllers, one per header family:
//! origin-server authentication (`WWW-Authenticate` / `Authorization` /
//! 401) and proxy authentication (`Proxy-Authenticate` /
//! `Proxy-Authorization` / 407).

use crate::auth::authenticator::AuthenticatorHandle;
use crate::auth::challenge::{parse_challenges, ChallengeEntry};
use crate::auth::credentials::CredentialProvider;
use crate::base::error::AuthError;
use crate::http::{Request, Response};
use http::header::{AUTHORIZATION, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, WWW_AUTHENTICATE};
use http::{HeaderName, StatusCode};
use std::sync::Mutex;

/// Which authentication header family a controller operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderTarget {
    /// Origin-server authentication: `WWW-Authenticate` → `Authorization`, status 401.
    Www,
    /// Proxy authentication: `Proxy-Authenticate` → `Proxy-Authorization`, status 407.
    Proxy,
}

impl HeaderTarget {
    /// Response header carrying the server's challenges.
    pub fn challenge_header(&self) -> HeaderName {
        match self {
            Self::Www => WWW_AUTHENTICATE,
            Self::Proxy => PROXY_AUTHENTICATE,
        }
    }

    /// Request header carrying the client's answer.
    pub fn authorization_header(&self) -> HeaderName {
        match self {
            Self::Www => AUTHORIZATION,
            Self::Proxy => PROXY_AUTHORIZATION,
        }
    }

    /// Status code that intrinsically signals a challenge.
    pub fn challenge_status(&self) -> StatusCode {
        match self {
            Self::Www => StatusCode::UNAUTHORIZED,
            Self::Proxy => StatusCode::PROXY_AUTHENTICATION_REQUIRED,
        }
    }
}

/// One registered scheme: name, handler, and its security ranking.
#[derive(Debug, Clone)]
pub struct Registration {
    pub scheme: String,
    pub handle: AuthenticatorHandle,
    pub security_level: i32,
}

/// Scheme-name → authenticator map, ordered by registration.
///
/// Registering a scheme twice replaces the earlier entry in place
/// (map semantics, not an accumulating list).
#[derive(Debug, Default)]
pub struct AuthenticatorRegistry {
    registrations: Vec<Registration>,
}

impl AuthenticatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        scheme: impl Into<String>,
        handle: AuthenticatorHandle,
        security_level: i32,
    ) {
        let scheme = scheme.into();
        let registration = Registration {
            scheme,
            handle,
            security_level,
        };
        if let Some(existing) = self
            .registrations
            .iter_mut()
            .find(|r| r.scheme.eq_ignore_ascii_case(&registration.scheme))
        {
            *existing = registration;
        } else {
            self.registrations.push(registration);
        }
    }

    pub fn get(&self, scheme: &str) -> Option<&Registration> {
        self.registrations
            .iter()
            .find(|r| r.scheme.eq_ignore_ascii_case(scheme))
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// True if any registered authenticator can decorate a request
    /// before the first challenge.
    pub fn can_pre_authenticate(&self) -> bool {
        self.registrations
            .iter()
            .any(|r| r.handle.can_pre_authenticate())
    }

    /// Pre-auth-ready registrations, best security level first.
    /// The sort is stable, so equal levels keep registration order.
    pub fn ready_registrations(&self) -> Vec<&Registration> {
        let mut ready: Vec<_> = self
            .registrations
            .iter()
            .filter(|r| r.handle.can_pre_authenticate())
            .collect();
        ready.sort_by(|a, b| b.security_level.cmp(&a.security_level));
        ready
    }

    /// Registrations able to answer one of the parsed challenges,
    /// paired with their matching entry, best security level first.
    pub fn candidates<'a>(
        &'a self,
        entries: &'a [ChallengeEntry],
    ) -> Vec<(&'a Registration, &'a ChallengeEntry)> {
        let mut candidates: Vec<_> = self
            .registrations
            .iter()
            .filter_map(|r| {
                entries
                    .iter()
                    .find(|e| e.scheme_is(&r.scheme) && r.handle.can_handle_challenge(e))
                    .map(|e| (r, e))
            })
            .collect();
        candidates.sort_by(|a, b| b.0.security_level.cmp(&a.0.security_level));
        candidates
    }
}

/// Controller states. `Exhausted` has no variant here: the retry loop
/// bounds its own iterations; the controller itself never refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthState {
    Idle,
    Challenged,
    Authenticating,
}

/// The challenge state machine for one header family.
pub struct AuthController {
    target: HeaderTarget,
    registry: AuthenticatorRegistry,
    state: Mutex<AuthState>,
}

impl AuthController {
    pub fn new(target: HeaderTarget) -> Self {
        Self {
            target,
            registry: AuthenticatorRegistry::new(),
            state: Mutex::new(AuthState::Idle),
        }
    }

    pub fn target(&self) -> HeaderTarget {
        self.target
    }

    pub fn registry(&self) -> &AuthenticatorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AuthenticatorRegistry {
        &mut self.registry
    }

    fn set_state(&self, state: AuthState) {
        if let Ok(mut guard) = self.state.lock() {
            *guard = state;
        }
    }

    /// Decorate the request before the first send, if any registered
    /// authenticator is ready and a credential exists for it.
    pub async fn pre_authenticate(
        &self,
        request: &mut Request,
        credentials: &dyn CredentialProvider,
    ) -> Result<(), AuthError> {
        for registration in self.registry.ready_registrations() {
            let Some(credential) = credentials.get_credential(request.url(), &registration.scheme)
            else {
                continue;
            };
            tracing::debug!(scheme = %registration.scheme, "pre-authenticating");
            return registration
                .handle
                .pre_authenticate(request, &credential)
                .await;
        }
        Ok(())
    }

    /// Synchronous equivalent of [`AuthController::pre_authenticate`].
    pub fn pre_authenticate_blocking(
        &self,
        request: &mut Request,
        credentials: &dyn CredentialProvider,
    ) -> Result<(), AuthError> {
        for registration in self.registry.ready_registrations() {
            let Some(credential) = credentials.get_credential(request.url(), &registration.scheme)
            else {
                continue;
            };
            return registration
                .handle
                .pre_authenticate_blocking(request, &credential);
        }
        Ok(())
    }

    /// Inspect a failed response and, if a registered authenticator can
    /// answer its challenge, mutate the request for the retry.
    ///
    /// Returns `false` when no candidate could handle the challenge, in
    /// which case the caller surfaces the original failure. Candidates
    /// are tried best-security-level first; one failing with a
    /// challenge-rejection error (missing parameter, unsupported
    /// variant, no credentials) falls through to the next.
    pub async fn handle_response(
        &self,
        response: &Response,
        request: &mut Request,
        credentials: &dyn CredentialProvider,
    ) -> Result<bool, AuthError> {
        let mut entries = Vec::new();
        for value in response.header_values(&self.target.challenge_header()) {
            entries.extend(parse_challenges(value));
        }
        if entries.is_empty() {
            return Ok(false);
        }
        self.set_state(AuthState::Challenged);

        for (registration, entry) in self.registry.candidates(&entries) {
            let Some(credential) = credentials.get_credential(request.url(), &registration.scheme)
            else {
                tracing::debug!(scheme = %registration.scheme, "no credentials, skipping");
                continue;
            };
            self.set_state(AuthState::Authenticating);
            match registration.handle.handle_challenge(entry).await {
                Ok(()) => {
                    let applied = registration
                        .handle
                        .pre_authenticate(request, &credential)
                        .await;
                    self.set_state(AuthState::Idle);
                    applied?;
                    tracing::debug!(
                        scheme = %registration.scheme,
                        level = registration.security_level,
                        "challenge handled"
                    );
                    return Ok(true);
                }
                Err(e) if e.is_challenge_rejection() => {
                    tracing::debug!(
                        scheme = %registration.scheme,
                        error = %e,
                        "authenticator rejected challenge, trying next"
                    );
                    continue;
                }
                Err(e) => {
                    self.set_state(AuthState::Idle);
                    return Err(e);
                }
            }
        }

        self.set_state(AuthState::Idle);
        Ok(false)
    }
}
