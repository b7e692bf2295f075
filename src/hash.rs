//! Content digests for cache-busted asset file names.

use sha2::{Digest, Sha256};

/// The number of hex characters kept from the digest.
pub const HASH_LENGTH: usize = 8;

/// Returns a short, stable hex digest of `content`. Identical bytes always
/// produce the same digest.
pub fn hash_content(content: &[u8]) -> String {
    let mut digest = hex::encode(Sha256::digest(content));
    digest.truncate(HASH_LENGTH);
    digest
}
