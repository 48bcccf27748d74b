//! Integrity digests for stored documents.

use sha2::{Digest, Sha256};

/// Compute the hex SHA-256 digest of a stored value.
pub fn compute_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Check `bytes` against a previously stored digest.
pub fn verify(bytes: &[u8], expected: &str) -> bool {
    compute_digest(bytes).eq_ignore_ascii_case(expected)
}
