//! Voter eligibility bookkeeping with irreversible vote-cast marking.
//!
//! The registry knows *who may vote* and *whether they have voted*, nothing
//! else. It never learns what anyone chose: the one cross-module call it
//! accepts, [`VoterRegistry::mark_voted`], carries no candidate and is
//! restricted to the single authorized caller (the booth).

mod voter_core;
pub use voter_core::{ConstituencyCounters, VoterRecord};

use std::collections::HashMap;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identity::VoterHash;
use crate::ledger::{LedgerEvent, TxContext};
use crate::model::auth::{Authority, Authorization};
use crate::model::ConstituencyId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRegistry {
    authorization: Authorization,
    registration_open: bool,
    voters: HashMap<VoterHash, VoterRecord>,
    total_registered: u64,
    total_voted: u64,
    per_constituency: HashMap<ConstituencyId, ConstituencyCounters>,
}

impl VoterRegistry {
    /// Create an empty registry owned by `owner`, with `authorized_caller`
    /// (the booth's identity) allowed to mark voters as having voted.
    pub fn new(owner: Authority, authorized_caller: Authority) -> Self {
        Self {
            authorization: Authorization::new(owner, authorized_caller),
            registration_open: true,
            voters: HashMap::new(),
            total_registered: 0,
            total_voted: 0,
            per_constituency: HashMap::new(),
        }
    }

    /// Register a voter into a constituency.
    pub fn register(
        &mut self,
        voter_hash: VoterHash,
        constituency_id: ConstituencyId,
        ctx: &mut TxContext,
    ) -> Result<()> {
        if !self.registration_open {
            return Err(Error::Validation("registration is closed".to_string()));
        }
        if voter_hash.is_sentinel() {
            return Err(Error::Validation(
                "voter hash must not be the zero sentinel".to_string(),
            ));
        }
        if self.voters.contains_key(&voter_hash) {
            return Err(Error::Validation(format!(
                "voter {voter_hash} is already registered"
            )));
        }

        self.voters
            .insert(voter_hash, VoterRecord::new(constituency_id, ctx.now()));
        self.total_registered += 1;
        self.per_constituency
            .entry(constituency_id)
            .or_default()
            .registered += 1;

        ctx.emit(LedgerEvent::VoterRegistered {
            voter_hash,
            constituency_id,
        });
        info!("registered voter {voter_hash} in constituency {constituency_id}");
        Ok(())
    }

    /// Record that a voter has cast their ballot. Authorized caller only.
    ///
    /// This call never receives the chosen candidate, and deliberately emits
    /// no event and no log line: anything tying the voter hash to the commit
    /// that also carries the vote would breach the privacy boundary.
    pub fn mark_voted(
        &mut self,
        caller: Authority,
        voter_hash: VoterHash,
        ctx: &TxContext,
    ) -> Result<()> {
        self.authorization.require_authorized(caller)?;

        let record = self
            .voters
            .get_mut(&voter_hash)
            .filter(|record| record.is_registered)
            .ok_or_else(|| Error::Eligibility("voter is not registered".to_string()))?;
        if record.has_voted {
            return Err(Error::Eligibility("voter has already voted".to_string()));
        }

        record.has_voted = true;
        record.voted_at = Some(ctx.now());
        let constituency_id = record.constituency_id;
        self.total_voted += 1;
        self.per_constituency
            .entry(constituency_id)
            .or_default()
            .voted += 1;
        Ok(())
    }

    /// Close registration. One-way: there is no reopening.
    pub fn close_registration(&mut self, ctx: &mut TxContext) -> Result<()> {
        if !self.registration_open {
            return Err(Error::Validation(
                "registration is already closed".to_string(),
            ));
        }
        self.registration_open = false;
        ctx.emit(LedgerEvent::RegistrationClosed);
        info!("registration closed with {} voters", self.total_registered);
        Ok(())
    }

    /// Point `mark_voted` at a replacement caller. Owner only, exactly once.
    pub fn rotate_authorized_caller(
        &mut self,
        caller: Authority,
        new_caller: Authority,
    ) -> Result<()> {
        self.authorization.rotate_authorized(caller, new_caller)
    }

    /// True iff the voter is registered and has not yet voted.
    pub fn is_eligible(&self, voter_hash: &VoterHash) -> bool {
        self.voters
            .get(voter_hash)
            .map(|record| record.is_registered && !record.has_voted)
            .unwrap_or(false)
    }

    pub fn is_registration_open(&self) -> bool {
        self.registration_open
    }

    pub fn total_registered(&self) -> u64 {
        self.total_registered
    }

    pub fn total_voted(&self) -> u64 {
        self.total_voted
    }

    pub fn registered_in(&self, constituency_id: ConstituencyId) -> u64 {
        self.per_constituency
            .get(&constituency_id)
            .map(|counters| counters.registered)
            .unwrap_or(0)
    }

    pub fn voted_in(&self, constituency_id: ConstituencyId) -> u64 {
        self.per_constituency
            .get(&constituency_id)
            .map(|counters| counters.voted)
            .unwrap_or(0)
    }

    /// Turnout as integer basis points (voted / registered × 10 000).
    /// Integer arithmetic keeps the figure deterministic across platforms.
    pub fn turnout_basis_points(&self) -> u64 {
        if self.total_registered == 0 {
            return 0;
        }
        self.total_voted * 10_000 / self.total_registered
    }
}
