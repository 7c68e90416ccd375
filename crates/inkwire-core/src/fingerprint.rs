//! Pinned certificate fingerprints.
//!
//! Format: 32 bytes of SHA-256 over the leaf certificate's DER encoding,
//! written as hex. Pairs may be separated by `:` or spaces, and case is
//! ignored, so both of these parse to the same value:
//! - `AB:CD:EF:...`
//! - `abcdef...`

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

const LEN: usize = 32;

/// SHA-256 fingerprint of a server certificate.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint([u8; LEN]);

impl Fingerprint {
    /// Fingerprint of a DER-encoded certificate.
    pub fn of(der: &[u8]) -> Self {
        let digest = Sha256::digest(der);
        let mut bytes = [0u8; LEN];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Check whether `der` hashes to this fingerprint.
    pub fn matches(&self, der: &[u8]) -> bool {
        Self::of(der) == *self
    }

    pub fn as_bytes(&self) -> &[u8; LEN] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s
            .chars()
            .filter(|c| *c != ':' && !c.is_whitespace())
            .collect();

        let bytes =
            hex::decode(&digits).map_err(|_| FingerprintParseError::NotHex(s.to_string()))?;
        let bytes: [u8; LEN] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| FingerprintParseError::WrongLength(b.len()))?;

        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = FingerprintParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.to_string()
    }
}

/// Error parsing a fingerprint string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FingerprintParseError {
    #[error("fingerprint must be hex, got: {0}")]
    NotHex(String),
    #[error("fingerprint must be 32 bytes (SHA-256), got {0}")]
    WrongLength(usize),
}
