//! Content-addressed cache key generation.
//!
//! Every component is length-prefixed before hashing so that no two distinct
//! component tuples produce the same hash input.

use sha2::{Digest, Sha256};

fn update_component(hasher: &mut Sha256, component: &[u8]) {
    hasher.update((component.len() as u64).to_le_bytes());
    hasher.update(component);
}

/// Compute the cache key of a classification result.
///
/// `facet` is hashed verbatim; `None` and `Some("")` yield different keys.
pub fn compute_cache_key(url: &str, content_type: &str, facet: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    update_component(&mut hasher, url.as_bytes());
    update_component(&mut hasher, content_type.as_bytes());
    match facet {
        Some(facet) => {
            hasher.update([1u8]);
            update_component(&mut hasher, facet.as_bytes());
        }
        None => hasher.update([0u8]),
    }
    hex::encode(hasher.finalize())
}

/// Compute the storage key of a page, from its canonical URL.
pub fn url_key(canonical_url: &str) -> String {
    hex::encode(Sha256::digest(canonical_url.as_bytes()))
}

/// Compute the storage key of a model prompt.
pub fn prompt_key(prompt: &str) -> String {
    hex::encode(Sha256::digest(prompt.as_bytes()))
}

/// Check that a key looks like a hex SHA-256 digest.
pub fn is_valid_key(key: &str) -> bool {
    key.len() == 64 && key.chars().all(|c| c.is_ascii_hexdigit())
}
