//! Content-derived object identifiers.

use crate::error::{LockError, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// SHA-256 of an object's stored bytes.
///
/// Two objects with the same content always share an id; any change to the
/// content, however small, yields a different one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id([u8; 32]);

impl Id {
    /// Compute the id of the given content.
    pub fn hash(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Id(bytes)
    }

    /// First eight hex characters, for display to operators.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.short())
    }
}

impl FromStr for Id {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = hex::decode(s)
            .map_err(|e| LockError::Backend(format!("invalid object id '{}': {}", s, e)))?;
        let bytes: [u8; 32] = raw.try_into().map_err(|_| {
            LockError::Backend(format!("invalid object id '{}': expected 64 hex digits", s))
        })?;
        Ok(Id(bytes))
    }
}
