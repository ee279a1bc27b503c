//! Request body for methods that send data.

use bytes::Bytes;

/// Body attached to an outgoing request.
///
/// The body is held in memory so a retried attempt can resend it
/// unchanged and the Digest `auth-int` path can hash the exact bytes
/// that go on the wire.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body (GET, HEAD, DELETE).
    #[default]
    Empty,
    /// Body with raw bytes.
    Bytes(Bytes),
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Bytes(Bytes::from(s))
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(v: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(v))
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        RequestBody::Bytes(Bytes::from(s.to_owned()))
    }
}

impl From<Bytes> for RequestBody {
    fn from(b: Bytes) -> Self {
        RequestBody::Bytes(b)
    }
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Bytes(b) => b.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RequestBody::Empty => 0,
            RequestBody::Bytes(b) => b.len(),
        }
    }

    /// Entity bytes for integrity hashing. `None` when no body exists;
    /// an empty byte body is still `Some` (it hashes as MD5 of "").
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Bytes(b) => Some(b.as_ref()),
        }
    }
}
