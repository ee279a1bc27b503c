//! Credential types and storage.

use dashmap::DashMap;
use std::sync::Arc;
use url::Url;
use zeroize::Zeroize;

/// A username/password pair, with an optional domain for schemes that
/// scope identities (NTLM-style). The password is wiped from memory on
/// drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
    pub domain: Option<String>,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            domain: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

/// Source of credentials for the retry orchestrator.
///
/// Looked up once per candidate authenticator: the URL identifies the
/// protection space, the scheme name selects among per-scheme entries.
pub trait CredentialProvider: Send + Sync {
    fn get_credential(&self, url: &Url, scheme: &str) -> Option<Credential>;
}

/// Thread-safe credential store keyed by `host:port:scheme`.
#[derive(Clone, Default)]
pub struct CredentialCache {
    entries: Arc<DashMap<String, Credential>>,
}

impl CredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(host: &str, port: u16, scheme: &str) -> String {
        format!("{}:{}:{}", host.to_lowercase(), port, scheme.to_lowercase())
    }

    fn url_key(url: &Url, scheme: &str) -> Option<String> {
        let host = url.host_str()?;
        let port = url.port_or_known_default().unwrap_or(0);
        Some(Self::key(host, port, scheme))
    }

    /// Store credentials for a host and scheme.
    pub fn store(&self, host: &str, port: u16, scheme: &str, credential: Credential) {
        self.entries.insert(Self::key(host, port, scheme), credential);
    }

    /// Store credentials for a URL's origin, under a scheme name.
    pub fn store_for_url(&self, url: &Url, scheme: &str, credential: Credential) {
        if let Some(key) = Self::url_key(url, scheme) {
            self.entries.insert(key, credential);
        }
    }

    pub fn lookup(&self, host: &str, port: u16, scheme: &str) -> Option<Credential> {
        self.entries
            .get(&Self::key(host, port, scheme))
            .map(|e| e.clone())
    }

    /// Remove credentials for a host (all ports and schemes).
    pub fn remove_host(&self, host: &str) {
        let prefix = format!("{}:", host.to_lowercase());
        self.entries.retain(|k, _| !k.starts_with(&prefix));
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CredentialProvider for CredentialCache {
    fn get_credential(&self, url: &Url, scheme: &str) -> Option<Credential> {
        let key = Self::url_key(url, scheme)?;
        self.entries.get(&key).map(|e| e.clone())
    }
}

/// One credential for every origin and scheme. Useful for clients that
/// talk to a single service.
#[derive(Clone)]
pub struct StaticCredentials {
    credential: Credential,
}

impl StaticCredentials {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

impl CredentialProvider for StaticCredentials {
    fn get_credential(&self, _url: &Url, _scheme: &str) -> Option<Credential> {
        Some(self.credential.clone())
    }
}
