//! Authorship secrets for comments.
//!
//! Every comment is inserted with a random secret whose digest is stored
//! on the row. Presenting the cleartext secret later authorizes deletion
//! without an account. The server compares digests itself and never
//! trusts a client-side affordance.

use quill_core::UserId;

use sha2::Digest;

/// Generates a fresh cleartext authorship secret.
pub fn generate() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// SHA-256 hex digest as stored on the comment row.
pub fn digest(secret: &str) -> String {
    hex::encode(sha2::Sha256::digest(secret.as_bytes()))
}

/// The delete authorization rule: admin, or secret match, or owner.
pub fn may_delete(
    caller: Option<UserId>,
    caller_is_admin: bool,
    presented_secret: Option<&str>,
    owner: Option<UserId>,
    stored_digest: Option<&str>,
) -> bool {
    if caller_is_admin {
        return true;
    }

    if let (Some(presented), Some(stored)) = (presented_secret, stored_digest) {
        if digest(presented) == stored {
            return true;
        }
    }

    matches!((caller, owner), (Some(caller), Some(owner)) if caller == owner)
}
