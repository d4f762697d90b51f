//! SHA-256 checksums for the session file audit trail.

use sha2::{Digest, Sha256};

/// Compute the SHA256 checksum of a byte slice
pub fn checksum_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    format!("{:x}", result)
}

/// Compute the SHA256 checksum of a string
pub fn checksum_str(s: &str) -> String {
    checksum_bytes(s.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_stable() {
        let a = checksum_str("n_treatment,n_control\n100,100\n");
        let b = checksum_bytes(b"n_treatment,n_control\n100,100\n");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_checksum_differs() {
        assert_ne!(checksum_str("a"), checksum_str("b"));
    }
}
