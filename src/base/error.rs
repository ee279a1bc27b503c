use http::StatusCode;
use thiserror::Error;

/// Errors produced by the authentication subsystem.
///
/// Challenge parsing never fails; malformed-but-recoverable header text is
/// absorbed by the parser. Everything that can fail after parsing lands
/// here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// A required challenge parameter (realm, nonce) was absent.
    ///
    /// The orchestrator treats this as "this authenticator cannot handle
    /// the challenge" and falls through to the next candidate.
    #[error("missing required challenge parameter: {0}")]
    MissingParameter(&'static str),

    /// The challenge named a digest algorithm other than MD5/MD5-sess.
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The challenge listed a qop token other than auth/auth-int.
    #[error("unsupported qop value: {0}")]
    UnsupportedQop(String),

    /// An authenticator was invoked outside its valid state window,
    /// e.g. generating a Digest response from an expired session.
    /// Callers must check `can_pre_authenticate` first.
    #[error("authenticator invoked out of state: {0}")]
    InvalidOperation(&'static str),

    /// No credential was available for the selected scheme.
    #[error("no credentials for scheme {0}")]
    MissingCredentials(String),

    /// A computed header value was not representable as an HTTP header.
    #[error("invalid header value")]
    InvalidHeader,

    /// The request was cancelled at a suspension point.
    #[error("request cancelled")]
    Cancelled,

    /// Terminal non-success status after authentication was exhausted.
    #[error("HTTP status {0}")]
    HttpStatus(StatusCode),

    /// Transport failure, propagated uninterpreted.
    #[error("transport error: {0}")]
    Transport(String),
}

impl AuthError {
    /// True for errors that disqualify one candidate authenticator
    /// without failing the whole request.
    pub fn is_challenge_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::MissingParameter(_)
                | AuthError::UnsupportedAlgorithm(_)
                | AuthError::UnsupportedQop(_)
                | AuthError::MissingCredentials(_)
        )
    }
}
