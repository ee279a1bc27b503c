pub mod authenticator;
pub mod basic;
pub mod challenge;
pub mod credentials;
pub mod digest;
pub mod registry;
pub mod retry;

// Re-exports for convenience
pub use authenticator::{AsyncAuthenticator, Authenticator, AuthenticatorHandle};
pub use basic::BasicAuthenticator;
pub use challenge::{parse_challenges, ChallengeEntry, ParamList};
pub use credentials::{Credential, CredentialCache, CredentialProvider, StaticCredentials};
pub use digest::{DigestAuthenticator, DigestSession};
pub use registry::{AuthController, AuthenticatorRegistry, HeaderTarget, Registration};
pub use retry::RetryPolicy;
