//! Caller identities and the authorization checks gating mutation.
//!
//! There is no ambient "owner" state: each module holds an [`Authorization`]
//! value and checks it explicitly at the top of its mutating operations.

use std::fmt::{self, Display, Formatter};

use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An opaque account identity presented by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Authority([u8; 20]);

impl Authority {
    /// Mint a fresh identity.
    pub fn random() -> Self {
        Self(rand::random())
    }

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Display for Authority {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", HEXLOWER.encode(&self.0))
    }
}

/// The pair of identities a module answers to: the deploying authority that
/// owns it, and the single delegate allowed to trigger its restricted call.
///
/// The delegate may be rotated exactly once, by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    owner: Authority,
    authorized_caller: Authority,
    rotated: bool,
}

impl Authorization {
    pub fn new(owner: Authority, authorized_caller: Authority) -> Self {
        Self {
            owner,
            authorized_caller,
            rotated: false,
        }
    }

    /// An authorization whose delegate is the owner itself.
    pub fn solo(owner: Authority) -> Self {
        Self::new(owner, owner)
    }

    pub fn owner(&self) -> Authority {
        self.owner
    }

    pub fn require_owner(&self, caller: Authority) -> Result<()> {
        if caller != self.owner {
            return Err(Error::Authorization(format!(
                "caller {caller} is not the owning authority"
            )));
        }
        Ok(())
    }

    pub fn require_authorized(&self, caller: Authority) -> Result<()> {
        if caller != self.authorized_caller {
            return Err(Error::Authorization(format!(
                "caller {caller} is not the authorized caller"
            )));
        }
        Ok(())
    }

    /// Point the restricted call at a new delegate. Owner only, and allowed
    /// exactly once over the lifetime of the module.
    pub fn rotate_authorized(&mut self, caller: Authority, new_caller: Authority) -> Result<()> {
        self.require_owner(caller)?;
        if self.rotated {
            return Err(Error::Authorization(
                "authorized caller has already been rotated".to_string(),
            ));
        }
        self.authorized_caller = new_caller;
        self.rotated = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_and_delegate_checks() {
        let owner = Authority::random();
        let delegate = Authority::random();
        let stranger = Authority::random();
        let auth = Authorization::new(owner, delegate);

        assert!(auth.require_owner(owner).is_ok());
        assert!(matches!(
            auth.require_owner(delegate),
            Err(Error::Authorization(_))
        ));
        assert!(auth.require_authorized(delegate).is_ok());
        assert!(matches!(
            auth.require_authorized(stranger),
            Err(Error::Authorization(_))
        ));
    }

    #[test]
    fn rotation_is_owner_gated_and_one_shot() {
        let owner = Authority::random();
        let delegate = Authority::random();
        let replacement = Authority::random();
        let mut auth = Authorization::new(owner, delegate);

        // Only the owner may rotate.
        assert!(auth.rotate_authorized(delegate, replacement).is_err());

        auth.rotate_authorized(owner, replacement).unwrap();
        assert!(auth.require_authorized(replacement).is_ok());
        assert!(auth.require_authorized(delegate).is_err());

        // A second rotation is rejected, even by the owner.
        assert!(matches!(
            auth.rotate_authorized(owner, delegate),
            Err(Error::Authorization(_))
        ));
    }
}
