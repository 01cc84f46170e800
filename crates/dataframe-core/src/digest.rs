//! Frame fingerprints.
//!
//! A digest is SHA-1 over a frame's wire bytes. It identifies structurally
//! identical frames; it is not a security primitive.

use std::fmt;

use sha1::{Digest as _, Sha1};

/// Digest length in bytes (160 bits).
pub const DIGEST_LEN: usize = 20;

/// A 160-bit fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Fingerprint `bytes`.
    pub fn of(bytes: &[u8]) -> Self {
        let hash = Sha1::digest(bytes);
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&hash);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}
