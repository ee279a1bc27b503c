//! HTTP Basic Authentication (RFC 7617).

use crate::auth::authenticator::Authenticator;
use crate::auth::challenge::ChallengeEntry;
use crate::auth::credentials::Credential;
use crate::auth::registry::HeaderTarget;
use crate::base::error::AuthError;
use crate::http::Request;
use std::sync::RwLock;

/// The Basic scheme authenticator.
///
/// Stateless apart from the realm of the last challenge: Basic is
/// always ready to pre-authenticate once credentials exist, since the
/// header value depends on nothing the server sends.
pub struct BasicAuthenticator {
    target: HeaderTarget,
    realm: RwLock<Option<String>>,
}

impl Default for BasicAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

impl BasicAuthenticator {
    pub fn new() -> Self {
        Self::for_target(HeaderTarget::Www)
    }

    pub fn for_target(target: HeaderTarget) -> Self {
        Self {
            target,
            realm: RwLock::new(None),
        }
    }

    /// Realm from the most recent challenge, if any.
    pub fn realm(&self) -> Option<String> {
        self.realm.read().ok()?.clone()
    }

    fn header_value(credential: &Credential) -> String {
        use base64::{engine::general_purpose, Engine as _};
        let creds = format!("{}:{}", credential.username, credential.password);
        format!("Basic {}", general_purpose::STANDARD.encode(creds))
    }
}

impl Authenticator for BasicAuthenticator {
    fn can_pre_authenticate(&self) -> bool {
        true
    }

    fn pre_authenticate(
        &self,
        request: &mut Request,
        credential: &Credential,
    ) -> Result<(), AuthError> {
        request.set_header(
            self.target.authorization_header(),
            &Self::header_value(credential),
        )
    }

    fn can_handle_challenge(&self, challenge: &ChallengeEntry) -> bool {
        challenge.scheme_is("Basic")
    }

    fn handle_challenge(&self, challenge: &ChallengeEntry) -> Result<(), AuthError> {
        if let Some(charset) = challenge.values.get("charset") {
            // RFC 7617 only defines UTF-8 here; anything else is noise.
            if !charset.eq_ignore_ascii_case("utf-8") {
                tracing::debug!(charset = %charset, "ignoring unknown basic charset");
            }
        }
        if let Ok(mut realm) = self.realm.write() {
            *realm = challenge.values.get("realm").map(str::to_string);
        }
        Ok(())
    }
}
