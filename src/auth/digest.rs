//! HTTP Digest Authentication (RFC 2617).
//!
//! Parses `Digest` challenges and generates `Authorization` headers.
//!
//! ## Supported Features
//! - MD5 and MD5-sess algorithms
//! - qop=auth and qop=auth-int (entity-body integrity)
//! - Nonce count tracking for replay protection, safe across
//!   concurrent requests sharing one session
//! - Session expiry: a session older than one hour is unusable for
//!   pre-authentication until the server challenges again

use crate::auth::authenticator::Authenticator;
use crate::auth::challenge::{parse_challenges, ChallengeEntry};
use crate::auth::credentials::Credential;
use crate::auth::registry::HeaderTarget;
use crate::base::error::AuthError;
use crate::http::Request;
use md5::{Digest, Md5};
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A session is stale for pre-authentication once this much time has
/// passed since its client nonce was generated.
const SESSION_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Digest hashing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    /// MD5 (the default when the challenge names none)
    #[default]
    Md5,
    /// MD5-sess (session-keyed HA1)
    Md5Sess,
}

impl DigestAlgorithm {
    fn parse(s: &str) -> Result<Self, AuthError> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "md5-sess" => Ok(Self::Md5Sess),
            _ => Err(AuthError::UnsupportedAlgorithm(s.to_string())),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Md5Sess => "MD5-sess",
        }
    }

    fn is_session(&self) -> bool {
        matches!(self, Self::Md5Sess)
    }
}

/// Quality-of-protection tokens offered by the server. A bitset: a
/// challenge may advertise both `auth` and `auth-int`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QopSet {
    auth: bool,
    auth_int: bool,
}

impl QopSet {
    fn parse(value: Option<&str>) -> Result<Self, AuthError> {
        let mut set = Self::default();
        let Some(value) = value else {
            return Ok(set);
        };
        for token in value.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            if token.eq_ignore_ascii_case("auth") {
                set.auth = true;
            } else if token.eq_ignore_ascii_case("auth-int") {
                set.auth_int = true;
            } else {
                return Err(AuthError::UnsupportedQop(token.to_string()));
            }
        }
        Ok(set)
    }

    pub fn offers_auth(&self) -> bool {
        self.auth
    }

    pub fn offers_auth_int(&self) -> bool {
        self.auth_int
    }

    /// The qop directive the client will actually use. `auth` is
    /// preferred when the server offers both.
    fn effective(&self) -> Option<Qop> {
        if self.auth {
            Some(Qop::Auth)
        } else if self.auth_int {
            Some(Qop::AuthInt)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Qop {
    Auth,
    AuthInt,
}

impl Qop {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::AuthInt => "auth-int",
        }
    }
}

/// State extracted from one Digest challenge, consumed by every
/// response generated until the server challenges again.
///
/// The whole session is replaced on a fresh challenge; the only field
/// mutated in place is the nonce counter, serialized by its mutex so
/// concurrent requests sharing the session never emit a duplicate
/// `(nonce, nc)` pair.
#[derive(Debug)]
pub struct DigestSession {
    realm: String,
    nonce: String,
    opaque: Option<String>,
    algorithm: DigestAlgorithm,
    qop: QopSet,
    stale: bool,
    cnonce: String,
    created_at: Instant,
    nonce_count: Mutex<u32>,
}

impl DigestSession {
    /// Build a session from a parsed challenge entry.
    ///
    /// `realm` and `nonce` are required; `algorithm` defaults to MD5;
    /// unknown algorithms and qop tokens are rejected.
    pub fn from_challenge(entry: &ChallengeEntry) -> Result<Self, AuthError> {
        let realm = entry
            .values
            .get("realm")
            .ok_or(AuthError::MissingParameter("realm"))?;
        let nonce = entry
            .values
            .get("nonce")
            .ok_or(AuthError::MissingParameter("nonce"))?;
        let algorithm = match entry.values.get("algorithm") {
            Some(s) => DigestAlgorithm::parse(s)?,
            None => DigestAlgorithm::default(),
        };
        let qop = QopSet::parse(entry.values.get("qop"))?;
        let opaque = entry.values.get("opaque").map(str::to_string);
        let stale = entry
            .values
            .get("stale")
            .is_some_and(|s| s.eq_ignore_ascii_case("true"));

        Ok(Self {
            realm: realm.to_string(),
            nonce: nonce.to_string(),
            opaque,
            algorithm,
            qop,
            stale,
            cnonce: generate_cnonce(),
            created_at: Instant::now(),
            nonce_count: Mutex::new(0),
        })
    }

    /// Build a session from a raw header value, e.g.
    /// `Digest realm="test", nonce="abc", qop="auth"`.
    pub fn parse_challenge(header: &str) -> Result<Self, AuthError> {
        let entries = parse_challenges(header);
        let entry = entries
            .iter()
            .find(|e| e.scheme_is("Digest") || e.scheme.is_empty())
            .ok_or(AuthError::MissingParameter("realm"))?;
        Self::from_challenge(entry)
    }

    /// True while this session may generate responses: a client nonce
    /// exists and less than an hour has passed since it was created.
    pub fn can_generate_response(&self) -> bool {
        !self.cnonce.is_empty() && self.created_at.elapsed() < SESSION_LIFETIME
    }

    /// The server flagged the previous nonce as expired while the
    /// credentials remain valid.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Generate the `Authorization` header value for one request.
    ///
    /// Increments the nonce count before hashing; a failed send still
    /// consumes a counter value (`nc` counts attempts, not successes),
    /// so there is no rollback path.
    pub fn compute_authorization(
        &self,
        credential: &Credential,
        method: &str,
        uri: &str,
        body: Option<&[u8]>,
    ) -> Result<String, AuthError> {
        if !self.can_generate_response() {
            return Err(AuthError::InvalidOperation("digest session expired"));
        }

        let nc = {
            let mut count = self
                .nonce_count
                .lock()
                .map_err(|_| AuthError::InvalidOperation("nonce counter poisoned"))?;
            *count += 1;
            *count
        };
        let nc = format!("{:08x}", nc);

        let qop = self.qop.effective();
        let response = self.compute_response(credential, method, uri, body, qop, &nc);
        Ok(self.assemble_credentials(&credential.username, uri, &response, qop, &nc))
    }

    fn compute_response(
        &self,
        credential: &Credential,
        method: &str,
        uri: &str,
        body: Option<&[u8]>,
        qop: Option<Qop>,
        nc: &str,
    ) -> String {
        // HA1 = H(user:realm:pass); session algorithms re-key with the
        // nonce pair.
        let mut ha1 = md5_hex(
            format!(
                "{}:{}:{}",
                credential.username, self.realm, credential.password
            )
            .as_bytes(),
        );
        if self.algorithm.is_session() {
            ha1 = md5_hex(format!("{}:{}:{}", ha1, self.nonce, self.cnonce).as_bytes());
        }

        // HA2 = H(method:uri), with the entity body folded in for
        // auth-int. A missing body hashes as the empty string.
        let ha2 = match qop {
            Some(Qop::AuthInt) => {
                let body_hash = md5_hex(body.unwrap_or_default());
                md5_hex(format!("{}:{}:{}", method, uri, body_hash).as_bytes())
            }
            _ => md5_hex(format!("{}:{}", method, uri).as_bytes()),
        };

        match qop {
            None => md5_hex(format!("{}:{}:{}", ha1, self.nonce, ha2).as_bytes()),
            Some(q) => md5_hex(
                format!(
                    "{}:{}:{}:{}:{}:{}",
                    ha1,
                    self.nonce,
                    nc,
                    self.cnonce,
                    q.as_str(),
                    ha2
                )
                .as_bytes(),
            ),
        }
    }

    fn assemble_credentials(
        &self,
        username: &str,
        uri: &str,
        response: &str,
        qop: Option<Qop>,
        nc: &str,
    ) -> String {
        let mut auth = format!(
            "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", nc={}",
            username, self.realm, self.nonce, uri, nc
        );

        if self.algorithm != DigestAlgorithm::Md5 {
            auth.push_str(&format!(", algorithm=\"{}\"", self.algorithm.as_str()));
        }

        if let Some(q) = qop {
            auth.push_str(&format!(", cnonce=\"{}\", qop={}", self.cnonce, q.as_str()));
        }

        if let Some(ref opaque) = self.opaque {
            auth.push_str(&format!(", opaque=\"{}\"", opaque));
        }

        auth.push_str(&format!(", response=\"{}\"", response));
        auth
    }
}

/// Client nonce: random printable hex. Not required to be
/// cryptographically strong (RFC 2617 §3.2.2).
fn generate_cnonce() -> String {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{:016x}", seed as u64 ^ (seed >> 64) as u64)
}

/// Hex-encoded MD5.
fn md5_hex(input: &[u8]) -> String {
    let digest = Md5::digest(input);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        write!(hex, "{:02x}", byte).unwrap();
    }
    hex
}

/// The Digest scheme authenticator.
///
/// One instance owns one [`DigestSession`], shared by every request
/// going through the same client. A fresh challenge replaces the
/// session wholesale behind a single reference swap, so readers racing
/// an update see either the fully-old or fully-new session.
pub struct DigestAuthenticator {
    target: HeaderTarget,
    session: RwLock<Option<Arc<DigestSession>>>,
    challenges_handled: AtomicU64,
}

impl Default for DigestAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

impl DigestAuthenticator {
    pub fn new() -> Self {
        Self::for_target(HeaderTarget::Www)
    }

    pub fn for_target(target: HeaderTarget) -> Self {
        Self {
            target,
            session: RwLock::new(None),
            challenges_handled: AtomicU64::new(0),
        }
    }

    fn current_session(&self) -> Option<Arc<DigestSession>> {
        self.session.read().ok()?.clone()
    }

    /// Number of challenges absorbed over this authenticator's
    /// lifetime. Diagnostic.
    pub fn challenges_handled(&self) -> u64 {
        self.challenges_handled.load(Ordering::Relaxed)
    }
}

impl Authenticator for DigestAuthenticator {
    fn can_pre_authenticate(&self) -> bool {
        self.current_session()
            .map(|s| s.can_generate_response())
            .unwrap_or(false)
    }

    fn pre_authenticate(
        &self,
        request: &mut Request,
        credential: &Credential,
    ) -> Result<(), AuthError> {
        let session = self
            .current_session()
            .ok_or(AuthError::InvalidOperation("no digest session"))?;
        let uri = request.path_and_query();
        let header = session.compute_authorization(
            credential,
            request.method().as_str(),
            &uri,
            request.body().as_bytes(),
        )?;
        request.set_header(self.target.authorization_header(), &header)
    }

    fn can_handle_challenge(&self, challenge: &ChallengeEntry) -> bool {
        challenge.scheme_is("Digest")
            && challenge.values.get("realm").is_some()
            && challenge.values.get("nonce").is_some()
    }

    fn handle_challenge(&self, challenge: &ChallengeEntry) -> Result<(), AuthError> {
        let session = DigestSession::from_challenge(challenge)?;
        if session.is_stale() {
            tracing::debug!(realm = %session.realm(), "stale nonce, credentials still valid");
        }
        tracing::debug!(realm = %session.realm(), "digest session replaced");

        let mut guard = self
            .session
            .write()
            .map_err(|_| AuthError::InvalidOperation("digest session lock poisoned"))?;
        *guard = Some(Arc::new(session));
        self.challenges_handled.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
