use log::info;
use serde::{Deserialize, Serialize};

use chrono::{DateTime, Utc};

use crate::config::ElectionConfig;
use crate::error::{Error, Result};
use crate::identity::VoterHash;
use crate::ledger::{LedgerEvent, TxContext};
use crate::model::auth::{Authority, Authorization};
use crate::model::booth::VotingBooth;
use crate::model::registry::VoterRegistry;
use crate::model::tallier::ResultsTallier;
use crate::model::{CandidateId, ConstituencyId};

use super::phase::{ElectionPhase, PhaseTransition};
use super::summary::ElectionSummary;

/// The election phase machine, and the sole caller authorized to mutate the
/// registry, booth and tallier as the election progresses.
///
/// Owns all three modules outright; cross-module effects flow through
/// explicit calls (the booth is handed the registry to mark voters, the
/// tallier is handed the booth to read counts), never shared mutable state.
/// Beyond the phase and its transition history the controller caches
/// nothing: summaries are recomputed from the owned modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionController {
    election_id: u64,
    election_name: String,
    authorization: Authorization,
    phase: ElectionPhase,
    transitions: Vec<PhaseTransition>,
    registry: VoterRegistry,
    booth: VotingBooth,
    tallier: ResultsTallier,
}

impl ElectionController {
    /// Stand up a fresh election in the Setup phase. The booth gets a newly
    /// minted identity, and the registry will accept `mark_voted` from that
    /// identity alone.
    pub fn new(config: &ElectionConfig) -> Self {
        let owner = config.owner();
        let booth_authority = Authority::random();
        Self {
            election_id: config.election_id(),
            election_name: config.election_name().to_string(),
            authorization: Authorization::solo(owner),
            phase: ElectionPhase::Setup,
            transitions: Vec::new(),
            registry: VoterRegistry::new(owner, booth_authority),
            booth: VotingBooth::new(booth_authority),
            tallier: ResultsTallier::new(),
        }
    }

    /// Register a voter. Setup phase, owner only.
    pub fn register_voter(
        &mut self,
        caller: Authority,
        voter_hash: VoterHash,
        constituency_id: ConstituencyId,
        ctx: &mut TxContext,
    ) -> Result<()> {
        self.authorization.require_owner(caller)?;
        self.require_phase(ElectionPhase::Setup)?;
        self.registry.register(voter_hash, constituency_id, ctx)
    }

    /// Register a candidate. Setup phase, owner only.
    pub fn register_candidate(
        &mut self,
        caller: Authority,
        candidate_id: CandidateId,
        constituency_id: ConstituencyId,
        ctx: &mut TxContext,
    ) -> Result<()> {
        self.authorization.require_owner(caller)?;
        self.require_phase(ElectionPhase::Setup)?;
        self.booth.register_candidate(candidate_id, constituency_id, ctx)
    }

    /// Register several candidates atomically. Setup phase, owner only.
    pub fn batch_register_candidates(
        &mut self,
        caller: Authority,
        slots: &[(CandidateId, ConstituencyId)],
        ctx: &mut TxContext,
    ) -> Result<()> {
        self.authorization.require_owner(caller)?;
        self.require_phase(ElectionPhase::Setup)?;
        self.booth.batch_register_candidates(slots, ctx)
    }

    /// Close registration and leave Setup.
    pub fn complete_setup(&mut self, caller: Authority, ctx: &mut TxContext) -> Result<()> {
        self.authorization.require_owner(caller)?;
        self.require_phase(ElectionPhase::Setup)?;
        self.registry.close_registration(ctx)?;
        self.advance_phase(ElectionPhase::Ready, ctx);
        Ok(())
    }

    /// Open the voting window and go Active.
    pub fn start_election(
        &mut self,
        caller: Authority,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        ctx: &mut TxContext,
    ) -> Result<()> {
        self.authorization.require_owner(caller)?;
        self.require_phase(ElectionPhase::Ready)?;
        self.booth.open_voting(start, end, ctx)?;
        self.advance_phase(ElectionPhase::Active, ctx);
        Ok(())
    }

    /// Accept a vote. Active phase; open to any caller, since identity
    /// checking happens inside the booth and registry, not here.
    pub fn submit_vote(
        &mut self,
        voter_hash: VoterHash,
        candidate_id: CandidateId,
        constituency_id: ConstituencyId,
        ctx: &mut TxContext,
    ) -> Result<()> {
        self.require_phase(ElectionPhase::Active)?;
        self.booth
            .cast_vote(&mut self.registry, voter_hash, candidate_id, constituency_id, ctx)
    }

    /// Close voting and go Closed.
    pub fn close_election(&mut self, caller: Authority, ctx: &mut TxContext) -> Result<()> {
        self.authorization.require_owner(caller)?;
        self.require_phase(ElectionPhase::Active)?;
        self.booth.close_voting(ctx)?;
        self.advance_phase(ElectionPhase::Closed, ctx);
        Ok(())
    }

    /// Tally every listed constituency, in order, then finalize.
    ///
    /// The three slices run in parallel: `candidate_ids_per_constituency[i]`
    /// and `expected_votes_per_constituency[i]` belong to
    /// `constituency_ids[i]`; mismatched lengths abort before any tally runs.
    /// This is the sole entry point that drives the tallier, and therefore
    /// the sole guarantor that every intended constituency is tallied before
    /// finalization: a constituency omitted here is never tallied, and
    /// reads for it will fail.
    pub fn tally_and_finalize(
        &mut self,
        caller: Authority,
        constituency_ids: &[ConstituencyId],
        candidate_ids_per_constituency: &[Vec<CandidateId>],
        expected_votes_per_constituency: &[u64],
        ctx: &mut TxContext,
    ) -> Result<()> {
        self.authorization.require_owner(caller)?;
        self.require_phase(ElectionPhase::Closed)?;
        if constituency_ids.len() != candidate_ids_per_constituency.len()
            || constituency_ids.len() != expected_votes_per_constituency.len()
        {
            return Err(Error::Validation(format!(
                "argument lengths disagree: {} constituencies, {} candidate lists, {} expected totals",
                constituency_ids.len(),
                candidate_ids_per_constituency.len(),
                expected_votes_per_constituency.len()
            )));
        }

        for (index, &constituency_id) in constituency_ids.iter().enumerate() {
            self.tallier.tally_constituency(
                &self.booth,
                constituency_id,
                &candidate_ids_per_constituency[index],
                expected_votes_per_constituency[index],
                ctx,
            )?;
        }
        self.tallier.finalize_results(ctx)?;
        self.advance_phase(ElectionPhase::Finalized, ctx);
        Ok(())
    }

    /// Point the registry's restricted call at a replacement booth identity.
    /// Owner only, exactly once; the booth keeps presenting its original
    /// identity, so after a rotation to a foreign identity every vote is
    /// rejected at the registry step and rolls back whole.
    pub fn rotate_registry_caller(
        &mut self,
        caller: Authority,
        new_caller: Authority,
    ) -> Result<()> {
        self.registry.rotate_authorized_caller(caller, new_caller)
    }

    pub fn summary(&self) -> ElectionSummary {
        ElectionSummary {
            election_id: self.election_id,
            election_name: self.election_name.clone(),
            phase: self.phase,
            total_registered: self.registry.total_registered(),
            total_voted: self.registry.total_voted(),
            turnout_basis_points: self.registry.turnout_basis_points(),
            voting_is_open: self.booth.is_open(),
            results_finalized: self.tallier.is_finalized(),
        }
    }

    pub fn phase(&self) -> ElectionPhase {
        self.phase
    }

    pub fn transitions(&self) -> &[PhaseTransition] {
        &self.transitions
    }

    pub fn registry(&self) -> &VoterRegistry {
        &self.registry
    }

    pub fn booth(&self) -> &VotingBooth {
        &self.booth
    }

    pub fn tallier(&self) -> &ResultsTallier {
        &self.tallier
    }

    fn require_phase(&self, expected: ElectionPhase) -> Result<()> {
        if self.phase != expected {
            return Err(Error::Phase(format!(
                "operation requires the {expected} phase, but the election is {}",
                self.phase
            )));
        }
        Ok(())
    }

    fn advance_phase(&mut self, to: ElectionPhase, ctx: &mut TxContext) {
        let from = self.phase;
        debug_assert!(to > from, "phase travel is strictly forward");
        self.phase = to;
        self.transitions.push(PhaseTransition {
            from,
            to,
            at: ctx.now(),
        });
        ctx.emit(LedgerEvent::PhaseChanged { from, to });
        info!("election {}: phase {from} -> {to}", self.election_id);
    }
}
