//! Hash utilities for the simulation core.
//!
//! Every mining, validation, and consensus code path uses the double digest
//! (`double_sha256_hex`) over its input composition; the single-round digest
//! is exposed as the underlying primitive. Compositions concatenate their
//! fields directly, with no delimiters or length prefixes, so neighboring
//! fields can alias across the boundary. That is a documented property of
//! the format, not something callers need to guard against.

use sha2::{Digest, Sha256};

/// Single-round SHA-256 over a string, hex-encoded (64 lowercase chars).
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Double SHA-256: the second round digests the raw 32-byte output of the
/// first, not its hex encoding.
pub fn double_sha256_hex(input: &str) -> String {
    let first = Sha256::digest(input.as_bytes());
    let second = Sha256::digest(first);
    hex::encode(second)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_round_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_double_round_known_vector() {
        // SHA256(SHA256("")) over raw digest bytes
        assert_eq!(
            double_sha256_hex(""),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn test_deterministic_and_fixed_length() {
        let a = double_sha256_hex("block payload42");
        let b = double_sha256_hex("block payload42");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_double_differs_from_single() {
        let input = "0genesis1700000000hello0";
        assert_ne!(sha256_hex(input), double_sha256_hex(input));
    }
}
