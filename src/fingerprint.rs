//! Option set fingerprints
//!
//! A fingerprint is a SHA256 digest of an option set's canonical bytes. It
//! identifies a key in logs and debug output; it never decides equality.

use crate::options::{OptionSet, OptionsError};
use sha2::{Digest, Sha256};
use std::fmt;

/// Fixed-length digest of canonical option bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Digest raw canonical bytes
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hasher.finalize().into())
    }

    /// Digest an option set's canonical serialization
    pub fn of_options<O: OptionSet>(options: &O) -> Result<Self, OptionsError> {
        Ok(Self::of_bytes(&options.canonical_bytes()?))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full lowercase hex form
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 12 hex characters, enough to tell keys apart in logs
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::BuildOptions;

    #[test]
    fn fingerprint_deterministic() {
        let a = Fingerprint::of_bytes(b"test content");
        let b = Fingerprint::of_bytes(b"test content");

        assert_eq!(a, b);
        assert_eq!(a.to_hex().len(), 64);
        assert_eq!(a.short().len(), 12);
        assert!(a.to_hex().starts_with(&a.short()));
    }

    #[test]
    fn fingerprint_different_content() {
        assert_ne!(
            Fingerprint::of_bytes(b"content 1"),
            Fingerprint::of_bytes(b"content 2")
        );
    }

    #[test]
    fn equal_options_share_fingerprint() {
        let a = BuildOptions::new().with("cpp", "copt", "-O2").with("core", "cpu", "k8");
        let b = BuildOptions::new().with("core", "cpu", "k8").with("cpp", "copt", "-O2");

        assert_eq!(
            Fingerprint::of_options(&a).unwrap(),
            Fingerprint::of_options(&b).unwrap()
        );
    }

    #[test]
    fn known_digest() {
        let empty = Fingerprint::of_bytes(b"");
        assert_eq!(
            empty.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
