// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content fingerprints — SHA-256 hashing of stored files.

use bildwerk_core::error::BildwerkError;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
///
/// Every file the store writes is fingerprinted this way so results can be
/// compared across runs.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Check a file on disk against an expected SHA-256 hex digest.
pub fn verify_file(path: impl AsRef<std::path::Path>, expected_hex: &str) -> Result<(), BildwerkError> {
    let data = std::fs::read(path.as_ref())?;
    let actual = hash_bytes(&data);
    if actual == expected_hex {
        Ok(())
    } else {
        Err(BildwerkError::Storage(format!(
            "{} changed on disk: expected {expected_hex}, got {actual}",
            path.as_ref().display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SHA-256 of the empty byte slice (well-known constant).
    const EMPTY_SHA256: &str =
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn hash_empty_input() {
        assert_eq!(hash_bytes(b""), EMPTY_SHA256);
    }

    #[test]
    fn hash_known_value() {
        // SHA-256("hello") — verified against coreutils sha256sum.
        let expected = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        assert_eq!(hash_bytes(b"hello"), expected);
    }

    #[test]
    fn verify_file_detects_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"bildwerk").expect("write");
        let digest = hash_bytes(b"bildwerk");
        assert!(verify_file(&path, &digest).is_ok());

        std::fs::write(&path, b"tampered").expect("rewrite");
        assert!(matches!(verify_file(&path, &digest), Err(BildwerkError::Storage(_))));
    }
}
