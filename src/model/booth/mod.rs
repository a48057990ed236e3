//! Privacy-preserving, exactly-once vote capture and tallying.
//!
//! The booth validates candidates, stores each ballot write-once under the
//! voter's hash, keeps per-candidate running totals, and notifies the
//! registry that the voter has voted. Tallies stay sealed until voting
//! closes; ballots stay sealed forever.

mod vote_core;
pub use vote_core::{CandidateSlot, VotingStatus, VotingWindow};
pub(crate) use vote_core::VoteRecord;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identity::VoterHash;
use crate::ledger::{LedgerEvent, TxContext};
use crate::model::auth::Authority;
use crate::model::registry::VoterRegistry;
use crate::model::{CandidateId, ConstituencyId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingBooth {
    /// Identity the booth presents when calling the registry.
    authority: Authority,
    voting_open: bool,
    window: Option<VotingWindow>,
    candidates: HashSet<CandidateSlot>,
    votes: HashMap<VoterHash, VoteRecord>,
    tallies: HashMap<CandidateId, u64>,
    total_votes: u64,
}

impl VotingBooth {
    pub fn new(authority: Authority) -> Self {
        Self {
            authority,
            voting_open: false,
            window: None,
            candidates: HashSet::new(),
            votes: HashMap::new(),
            tallies: HashMap::new(),
            total_votes: 0,
        }
    }

    /// The identity this booth presents to the registry.
    pub fn authority(&self) -> Authority {
        self.authority
    }

    /// Enter a candidate as contestable in a constituency.
    pub fn register_candidate(
        &mut self,
        candidate_id: CandidateId,
        constituency_id: ConstituencyId,
        ctx: &mut TxContext,
    ) -> Result<()> {
        if self.voting_open {
            return Err(Error::Phase(
                "candidates cannot be registered while voting is open".to_string(),
            ));
        }
        if candidate_id == 0 || constituency_id == 0 {
            return Err(Error::Validation(
                "candidate and constituency identifiers must be positive".to_string(),
            ));
        }
        let slot = CandidateSlot::new(candidate_id, constituency_id);
        if !self.candidates.insert(slot) {
            return Err(Error::Validation(format!(
                "candidate {candidate_id} is already registered in constituency {constituency_id}"
            )));
        }

        ctx.emit(LedgerEvent::CandidateRegistered {
            candidate_id,
            constituency_id,
        });
        info!("registered candidate {candidate_id} in constituency {constituency_id}");
        Ok(())
    }

    /// Register several candidates in one transaction. A failure anywhere in
    /// the batch aborts the enclosing transaction, so either every slot is
    /// entered or none are.
    pub fn batch_register_candidates(
        &mut self,
        slots: &[(CandidateId, ConstituencyId)],
        ctx: &mut TxContext,
    ) -> Result<()> {
        for &(candidate_id, constituency_id) in slots {
            self.register_candidate(candidate_id, constituency_id, ctx)?;
        }
        Ok(())
    }

    /// Open the voting window.
    pub fn open_voting(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        ctx: &mut TxContext,
    ) -> Result<()> {
        if self.voting_open {
            return Err(Error::Phase("voting is already open".to_string()));
        }
        if end <= start {
            return Err(Error::Validation(
                "voting window must end after it starts".to_string(),
            ));
        }
        if start < ctx.now() {
            return Err(Error::Validation(
                "voting window must not start in the past".to_string(),
            ));
        }

        self.window = Some(VotingWindow { start, end });
        self.voting_open = true;
        ctx.emit(LedgerEvent::VotingOpened { start, end });
        info!("voting opened for {start} to {end}");
        Ok(())
    }

    /// Close voting, early or on schedule. The only way tallies become
    /// readable.
    pub fn close_voting(&mut self, ctx: &mut TxContext) -> Result<()> {
        if !self.voting_open {
            return Err(Error::Phase("voting is not open".to_string()));
        }
        self.voting_open = false;
        let window = self.window.expect("open booth always has a window");
        ctx.emit(LedgerEvent::VotingClosed {
            start: window.start,
            end: window.end,
        });
        info!("voting closed with {} votes cast", self.total_votes);
        Ok(())
    }

    /// Accept one vote from an eligible voter.
    ///
    /// Validation order: voting gate and window, registry eligibility, the
    /// booth's own write-once submission check (belt and braces against
    /// registry desync), then candidate validity. The registry notification
    /// comes last; if it fails, the enclosing transaction rolls every local
    /// write back.
    pub fn cast_vote(
        &mut self,
        registry: &mut VoterRegistry,
        voter_hash: VoterHash,
        candidate_id: CandidateId,
        constituency_id: ConstituencyId,
        ctx: &mut TxContext,
    ) -> Result<()> {
        if !self.voting_open {
            return Err(Error::Phase("voting is not open".to_string()));
        }
        let window = self.window.expect("open booth always has a window");
        let now = ctx.now();
        if now < window.start || now > window.end {
            return Err(Error::Phase(format!(
                "vote arrived outside the voting window ({} to {})",
                window.start, window.end
            )));
        }
        if !registry.is_eligible(&voter_hash) {
            return Err(Error::Eligibility(
                "voter is not registered or has already voted".to_string(),
            ));
        }
        if self.votes.contains_key(&voter_hash) {
            return Err(Error::Eligibility(
                "a vote has already been submitted for this voter".to_string(),
            ));
        }
        if !self.is_candidate_valid(constituency_id, candidate_id) {
            return Err(Error::Validation(format!(
                "candidate {candidate_id} is not standing in constituency {constituency_id}"
            )));
        }

        self.votes.insert(
            voter_hash,
            VoteRecord {
                candidate_id,
                constituency_id,
                cast_at: now,
                sequence: ctx.sequence(),
            },
        );
        *self.tallies.entry(candidate_id).or_insert(0) += 1;
        self.total_votes += 1;

        registry.mark_voted(self.authority, voter_hash, ctx)?;

        // Ordering metadata only; the voter hash must never appear here.
        ctx.emit(LedgerEvent::VoteCast {
            candidate_id,
            constituency_id,
        });
        debug!(
            "vote {} recorded for candidate {candidate_id} in constituency {constituency_id}",
            ctx.sequence()
        );
        Ok(())
    }

    /// Per-candidate tally. Sealed until voting closes: reading it earlier is
    /// a correctness violation, not a convenience gap.
    pub fn vote_count(&self, candidate_id: CandidateId) -> Result<u64> {
        if self.voting_open {
            return Err(Error::Phase(
                "tallies are sealed while voting is open".to_string(),
            ));
        }
        Ok(self.tallies.get(&candidate_id).copied().unwrap_or(0))
    }

    /// Total ballots accepted. Sealed until voting closes.
    pub fn total_votes(&self) -> Result<u64> {
        if self.voting_open {
            return Err(Error::Phase(
                "tallies are sealed while voting is open".to_string(),
            ));
        }
        Ok(self.total_votes)
    }

    /// Whether a ballot exists for this voter. Key existence is the only fact
    /// the booth ever discloses about a ballot.
    pub fn has_submitted(&self, voter_hash: &VoterHash) -> bool {
        self.votes.contains_key(voter_hash)
    }

    pub fn is_candidate_valid(
        &self,
        constituency_id: ConstituencyId,
        candidate_id: CandidateId,
    ) -> bool {
        self.candidates
            .contains(&CandidateSlot::new(candidate_id, constituency_id))
    }

    pub fn is_open(&self) -> bool {
        self.voting_open
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn voting_status(&self, now: DateTime<Utc>) -> VotingStatus {
        VotingStatus {
            is_open: self.voting_open,
            start: self.window.map(|window| window.start),
            end: self.window.map(|window| window.end),
            now,
        }
    }
}
