//! Opaque voter identities.
//!
//! The core never sees raw credentials: the biometric pipeline verifies a
//! voter off-ledger and hands us a keyed hash of the match. [`VoterHash`] is
//! the only identifier the ledger ever stores, and [`IdentityKey`] is the
//! boundary helper that derives one.

use std::fmt::{self, Display, Formatter};

use data_encoding::HEXLOWER;
use hmac::{digest::Output, Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

pub type HmacSha256 = Hmac<Sha256>;

/// A voter's opaque, privacy-preserving identity token: the HMAC of their
/// verified credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoterHash(Output<HmacSha256>);

impl VoterHash {
    /// The all-zero hash is reserved as a "no voter" sentinel and is rejected
    /// at registration.
    pub fn is_sentinel(&self) -> bool {
        self.0.iter().all(|byte| *byte == 0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for VoterHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes.into())
    }
}

impl Display for VoterHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", HEXLOWER.encode(&self.0))
    }
}

/// Secret key used to derive voter hashes from verified credentials.
///
/// Held by the identity layer, not the ledger; it exists here so embedders and
/// tests can mint hashes the same way the production pipeline does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityKey(Vec<u8>);

impl IdentityKey {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    /// Generate a fresh random key.
    pub fn random() -> Self {
        Self(rand::random::<[u8; 32]>().to_vec())
    }

    /// Derive the voter hash for a verified credential.
    pub fn hash_credential(&self, credential: &[u8]) -> VoterHash {
        let mut mac =
            HmacSha256::new_from_slice(&self.0).expect("HMAC accepts any key length");
        mac.update(credential);
        VoterHash(mac.finalize().into_bytes())
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl VoterHash {
        pub fn example(seed: u8) -> Self {
            Self::from([seed; 32])
        }
    }

    impl IdentityKey {
        pub fn example() -> Self {
            Self::new(*b"example-identity-key-for-testing")
        }
    }
}
