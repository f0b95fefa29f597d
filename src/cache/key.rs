// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Deterministic cache key derivation.
//!
//! `{prefix}:{sha256(sorted "k=v" pairs joined by "&")}`, hex encoded. The
//! same logical parameters always yield the same key regardless of the order
//! they are passed in.

use sha2::{Digest, Sha256};

#[must_use]
pub fn cache_key(prefix: &str, params: &[(&str, &str)]) -> String {
    let mut pairs: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    pairs.sort_unstable();

    let digest = Sha256::digest(pairs.join("&").as_bytes());
    format!("{}:{}", prefix, hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_independent() {
        let a = cache_key("page", &[("limit", "20"), ("offset", "40")]);
        let b = cache_key("page", &[("offset", "40"), ("limit", "20")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_prefix_and_digest_shape() {
        let key = cache_key("creature", &[("id", "25")]);
        let (prefix, digest) = key.split_once(':').unwrap();

        assert_eq!(prefix, "creature");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_distinct_params_distinct_keys() {
        assert_ne!(cache_key("creature", &[("id", "1")]), cache_key("creature", &[("id", "2")]));
        assert_ne!(cache_key("creature", &[("id", "1")]), cache_key("species", &[("id", "1")]));
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            cache_key("x", &[("id", "1")]),
            "x:d9fc91d45c096b5e27dc6304d8015dc5cb0a959cd078ca25fafcf2333087728e"
        );
    }
}
