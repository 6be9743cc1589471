//! Structural hashing.
//!
//! Every axis, goal, coverpoint and covergroup carries a SHA-256 digest of its
//! definition. During the definition pass of the chain encoder these digests
//! are folded together with [`Digest::combine`], which hashes the running
//! digest followed by the node digest. The fold is order-sensitive: swapping
//! two siblings, renaming a node, or re-assigning a single bucket goal all
//! yield a different root digest. Two readings may only be merged when their
//! root digests (`def_sha`) are equal.

use sha2::{Digest as _, Sha256};
use std::fmt;

/// A finished SHA-256 digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Fold `other` into `self`: `sha256(self || other)`
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(self.0);
        hasher.update(other.0);
        Self(hasher.finalize().into())
    }

    /// Raw digest bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lower-case hex rendering
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Streaming structural hash
///
/// Seeded with a node's name and description, then updated with whatever
/// makes up the node's structure, in declaration order.
#[derive(Debug, Clone)]
pub struct StructuralHash {
    hasher: Sha256,
}

impl StructuralHash {
    /// Start a hash over `name + description`
    #[must_use]
    pub fn new(name: &str, description: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        hasher.update(description.as_bytes());
        Self { hasher }
    }

    /// Absorb a string
    pub fn update_str(&mut self, value: &str) {
        self.hasher.update(value.as_bytes());
    }

    /// Absorb a child digest
    pub fn absorb(&mut self, digest: &Digest) {
        self.hasher.update(digest.as_bytes());
    }

    /// Finish without consuming, so more data may still be absorbed
    #[must_use]
    pub fn digest(&self) -> Digest {
        Digest(self.hasher.clone().finalize().into())
    }

    /// Finish the hash
    #[must_use]
    pub fn finish(self) -> Digest {
        Digest(self.hasher.finalize().into())
    }
}
