//! Anonymized user ids.
//!
//! Consumers that must not see real user ids look records up by an
//! anonymized id instead. The derivation is supplied by the host platform;
//! [`SaltedDigest`] is the default.

use std::fmt;

use sha2::{Digest, Sha256};
use tracing::instrument;

/// Maximum length of an anonymized id, matching the column width.
pub const ANONYMOUS_ID_MAX_LEN: usize = 50;

/// Hex characters kept from the digest.
const DIGEST_PREFIX_LEN: usize = 32;

/// Derives a stable, non-reversible id for a user.
pub trait AnonymousIdentity {
    /// Returns the anonymized id for `user_id`. At most
    /// [`ANONYMOUS_ID_MAX_LEN`] characters.
    fn anonymous_id(&self, user_id: i32) -> String;
}

/// SHA-256 over a platform secret followed by the decimal user id.
#[derive(Clone)]
pub struct SaltedDigest {
    secret: String,
}

impl SaltedDigest {
    /// Creates a digest keyed by `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for SaltedDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaltedDigest")
            .field("secret", &"***REDACTED***")
            .finish()
    }
}

impl AnonymousIdentity for SaltedDigest {
    #[instrument(skip(self))]
    fn anonymous_id(&self, user_id: i32) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(user_id.to_string().as_bytes());
        let mut id = hex::encode(hasher.finalize());
        id.truncate(DIGEST_PREFIX_LEN);
        id
    }
}
