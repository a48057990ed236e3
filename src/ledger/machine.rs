use chrono::{DateTime, Utc};
use log::debug;

use crate::config::ElectionConfig;
use crate::error::Result;
use crate::identity::VoterHash;
use crate::model::auth::Authority;
use crate::model::booth::VotingStatus;
use crate::model::election::{
    ElectionController, ElectionPhase, ElectionSummary, PhaseTransition,
};
use crate::model::tallier::{CandidateResult, ConstituencyResult};
use crate::model::{CandidateId, ConstituencyId};

use super::clock::LedgerClock;
use super::counter::Counter;
use super::event::{EventLog, LedgerEvent, SealedEvent};

/// What one in-flight transaction sees: the ledger time and would-be commit
/// sequence, plus a buffer for the events it stages. Staged events are only
/// sealed into the log if the transaction commits.
#[derive(Debug)]
pub struct TxContext {
    now: DateTime<Utc>,
    sequence: u64,
    staged: Vec<LedgerEvent>,
}

impl TxContext {
    fn new(now: DateTime<Utc>, sequence: u64) -> Self {
        Self {
            now,
            sequence,
            staged: Vec::new(),
        }
    }

    /// Ledger time at the start of this transaction.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// The sequence number this transaction will hold if it commits.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Stage an event for emission on commit.
    pub fn emit(&mut self, event: LedgerEvent) {
        self.staged.push(event);
    }
}

/// The election state machine mounted on its ledger: a strictly ordered
/// stream of transactions, each executing to completion or aborting
/// completely before the next begins.
///
/// Every mutating entry point runs against a working copy of the committed
/// state; only a successful run is swapped in, allocated a commit sequence,
/// and has its staged events sealed. A failed precondition anywhere leaves
/// the ledger byte-for-byte unchanged; there is no partial application and
/// nothing to retry inside the core.
#[derive(Debug, Clone)]
pub struct ElectionLedger {
    controller: ElectionController,
    clock: LedgerClock,
    sequence: Counter,
    events: EventLog,
}

impl ElectionLedger {
    /// Deploy a fresh election following the host clock.
    pub fn new(config: ElectionConfig) -> Self {
        Self::with_clock(config, LedgerClock::System)
    }

    /// Deploy a fresh election on the given clock.
    pub fn with_clock(config: ElectionConfig, clock: LedgerClock) -> Self {
        Self {
            controller: ElectionController::new(&config),
            clock,
            sequence: Counter::new(1),
            events: EventLog::new(),
        }
    }

    fn transact<T>(
        &mut self,
        f: impl FnOnce(&mut ElectionController, &mut TxContext) -> Result<T>,
    ) -> Result<T> {
        let mut working = self.controller.clone();
        let mut ctx = TxContext::new(self.clock.now(), self.sequence.peek());
        match f(&mut working, &mut ctx) {
            Ok(value) => {
                let TxContext { now, staged, .. } = ctx;
                let sequence = self.sequence.advance();
                self.controller = working;
                self.events.seal(sequence, now, staged);
                Ok(value)
            }
            Err(err) => {
                debug!("transaction aborted: {err}");
                Err(err)
            }
        }
    }

    // ---- Mutating entry points (one ledger transaction each) ----

    /// Register a voter into a constituency. Setup phase, owner only.
    pub fn register_voter(
        &mut self,
        caller: Authority,
        voter_hash: VoterHash,
        constituency_id: ConstituencyId,
    ) -> Result<()> {
        self.transact(|state, ctx| state.register_voter(caller, voter_hash, constituency_id, ctx))
    }

    /// Register a candidate in a constituency. Setup phase, owner only.
    pub fn register_candidate(
        &mut self,
        caller: Authority,
        candidate_id: CandidateId,
        constituency_id: ConstituencyId,
    ) -> Result<()> {
        self.transact(|state, ctx| {
            state.register_candidate(caller, candidate_id, constituency_id, ctx)
        })
    }

    /// Register several candidates in one transaction: all slots or none.
    pub fn batch_register_candidates(
        &mut self,
        caller: Authority,
        slots: &[(CandidateId, ConstituencyId)],
    ) -> Result<()> {
        self.transact(|state, ctx| state.batch_register_candidates(caller, slots, ctx))
    }

    /// Close registration and move to Ready.
    pub fn complete_setup(&mut self, caller: Authority) -> Result<()> {
        self.transact(|state, ctx| state.complete_setup(caller, ctx))
    }

    /// Open the voting window and move to Active.
    pub fn start_election(
        &mut self,
        caller: Authority,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<()> {
        self.transact(|state, ctx| state.start_election(caller, start, end, ctx))
    }

    /// Submit a vote. Returns the commit sequence of the accepted ballot,
    /// the ledger's authoritative "who voted first" position.
    pub fn submit_vote(
        &mut self,
        voter_hash: VoterHash,
        candidate_id: CandidateId,
        constituency_id: ConstituencyId,
    ) -> Result<u64> {
        self.transact(|state, ctx| {
            state.submit_vote(voter_hash, candidate_id, constituency_id, ctx)?;
            Ok(ctx.sequence())
        })
    }

    /// Close voting and move to Closed.
    pub fn close_election(&mut self, caller: Authority) -> Result<()> {
        self.transact(|state, ctx| state.close_election(caller, ctx))
    }

    /// Tally the listed constituencies in order, then finalize and move to
    /// Finalized. All-or-none: a mismatch in any constituency aborts every
    /// tally in the batch.
    pub fn tally_and_finalize(
        &mut self,
        caller: Authority,
        constituency_ids: &[ConstituencyId],
        candidate_ids_per_constituency: &[Vec<CandidateId>],
        expected_votes_per_constituency: &[u64],
    ) -> Result<()> {
        self.transact(|state, ctx| {
            state.tally_and_finalize(
                caller,
                constituency_ids,
                candidate_ids_per_constituency,
                expected_votes_per_constituency,
                ctx,
            )
        })
    }

    /// Rotate the registry's authorized caller. Owner only, exactly once.
    pub fn rotate_registry_caller(
        &mut self,
        caller: Authority,
        new_caller: Authority,
    ) -> Result<()> {
        self.transact(|state, _| state.rotate_registry_caller(caller, new_caller))
    }

    // ---- Pure reads ----

    pub fn summary(&self) -> ElectionSummary {
        self.controller.summary()
    }

    pub fn phase(&self) -> ElectionPhase {
        self.controller.phase()
    }

    pub fn transitions(&self) -> &[PhaseTransition] {
        self.controller.transitions()
    }

    pub fn voting_status(&self) -> VotingStatus {
        self.controller.booth().voting_status(self.clock.now())
    }

    pub fn is_eligible(&self, voter_hash: &VoterHash) -> bool {
        self.controller.registry().is_eligible(voter_hash)
    }

    pub fn has_submitted(&self, voter_hash: &VoterHash) -> bool {
        self.controller.booth().has_submitted(voter_hash)
    }

    pub fn is_candidate_valid(
        &self,
        constituency_id: ConstituencyId,
        candidate_id: CandidateId,
    ) -> bool {
        self.controller
            .booth()
            .is_candidate_valid(constituency_id, candidate_id)
    }

    /// Per-candidate tally; fails while voting is open.
    pub fn vote_count(&self, candidate_id: CandidateId) -> Result<u64> {
        self.controller.booth().vote_count(candidate_id)
    }

    /// Result for one constituency; fails until results are finalized.
    pub fn constituency_result(
        &self,
        constituency_id: ConstituencyId,
    ) -> Result<&ConstituencyResult> {
        self.controller.tallier().constituency_result(constituency_id)
    }

    /// Result for one candidate; fails until results are finalized.
    pub fn candidate_result(&self, candidate_id: CandidateId) -> Result<&CandidateResult> {
        self.controller.tallier().candidate_result(candidate_id)
    }

    pub fn constituency_results(
        &self,
        constituency_ids: &[ConstituencyId],
    ) -> Result<Vec<&ConstituencyResult>> {
        self.controller.tallier().constituency_results(constituency_ids)
    }

    pub fn candidate_results_for(
        &self,
        constituency_id: ConstituencyId,
    ) -> Result<Vec<&CandidateResult>> {
        self.controller.tallier().candidate_results_for(constituency_id)
    }

    /// The append-only audit stream, in commit order.
    pub fn events(&self) -> &[SealedEvent] {
        self.events.all()
    }

    /// The committed state, for read-only inspection.
    pub fn controller(&self) -> &ElectionController {
        &self.controller
    }

    pub fn clock(&self) -> &LedgerClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut LedgerClock {
        &mut self.clock
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::collections::HashSet;

    use crate::error::Error;

    const CONSTITUENCY: ConstituencyId = 1;
    const CANDIDATE_X: CandidateId = 10;
    const CANDIDATE_Y: CandidateId = 20;

    fn nine_am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn ten_am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    fn eleven_am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap()
    }

    /// Ledger with voters A, B, C and candidates X, Y in constituency 1,
    /// setup completed, clock at 09:00.
    fn ready_ledger() -> (ElectionLedger, Authority, [VoterHash; 3]) {
        let config = ElectionConfig::example();
        let owner = config.owner();
        let mut ledger = ElectionLedger::with_clock(config, LedgerClock::manual(nine_am()));

        let voters = [
            VoterHash::example(1),
            VoterHash::example(2),
            VoterHash::example(3),
        ];
        for voter in voters {
            ledger.register_voter(owner, voter, CONSTITUENCY).unwrap();
        }
        ledger
            .batch_register_candidates(
                owner,
                &[(CANDIDATE_X, CONSTITUENCY), (CANDIDATE_Y, CONSTITUENCY)],
            )
            .unwrap();
        ledger.complete_setup(owner).unwrap();
        (ledger, owner, voters)
    }

    /// The same ledger with voting open 10:00-11:00 and the clock inside the
    /// window.
    fn active_ledger() -> (ElectionLedger, Authority, [VoterHash; 3]) {
        let (mut ledger, owner, voters) = ready_ledger();
        ledger.start_election(owner, ten_am(), eleven_am()).unwrap();
        ledger.clock_mut().set(ten_am() + Duration::minutes(5));
        (ledger, owner, voters)
    }

    #[test]
    fn end_to_end_scenario() {
        let (mut ledger, owner, [a, b, c]) = active_ledger();

        ledger.submit_vote(a, CANDIDATE_X, CONSTITUENCY).unwrap();
        ledger.submit_vote(b, CANDIDATE_X, CONSTITUENCY).unwrap();
        ledger.submit_vote(c, CANDIDATE_Y, CONSTITUENCY).unwrap();

        ledger.clock_mut().set(eleven_am() + Duration::minutes(1));
        ledger.close_election(owner).unwrap();
        assert_eq!(ledger.phase(), ElectionPhase::Closed);

        // Results are unreadable before finalization.
        assert!(matches!(
            ledger.constituency_result(CONSTITUENCY),
            Err(Error::Consistency(_))
        ));

        ledger
            .tally_and_finalize(
                owner,
                &[CONSTITUENCY],
                &[vec![CANDIDATE_X, CANDIDATE_Y]],
                &[3],
            )
            .unwrap();
        assert_eq!(ledger.phase(), ElectionPhase::Finalized);

        let result = ledger.constituency_result(CONSTITUENCY).unwrap().clone();
        assert_eq!(result.winner, Some(CANDIDATE_X));
        assert_eq!(result.winner_vote_count, 2);
        assert!(!result.is_tied);
        assert_eq!(result.total_votes, 3);

        // Reads are stable on repetition.
        assert_eq!(ledger.constituency_result(CONSTITUENCY).unwrap(), &result);
        assert_eq!(
            ledger.candidate_result(CANDIDATE_Y).unwrap().vote_count,
            1
        );

        let summary = ledger.summary();
        assert_eq!(summary.total_registered, 3);
        assert_eq!(summary.total_voted, 3);
        assert_eq!(summary.turnout_basis_points, 10_000);
        assert!(summary.results_finalized);
    }

    #[test]
    fn one_vote_per_voter() {
        let (mut ledger, _, [a, _, _]) = active_ledger();

        ledger.submit_vote(a, CANDIDATE_X, CONSTITUENCY).unwrap();
        // A second attempt with any candidate fails.
        for candidate in [CANDIDATE_X, CANDIDATE_Y] {
            assert!(matches!(
                ledger.submit_vote(a, candidate, CONSTITUENCY),
                Err(Error::Eligibility(_))
            ));
        }
        assert!(ledger.has_submitted(&a));
        assert!(!ledger.is_eligible(&a));
        assert_eq!(ledger.summary().total_voted, 1);
    }

    #[test]
    fn commit_order_is_voting_order() {
        let (mut ledger, _, [a, b, c]) = active_ledger();

        let first = ledger.submit_vote(a, CANDIDATE_X, CONSTITUENCY).unwrap();
        // A rejected transaction consumes no sequence number.
        assert!(ledger.submit_vote(a, CANDIDATE_Y, CONSTITUENCY).is_err());
        let second = ledger.submit_vote(b, CANDIDATE_X, CONSTITUENCY).unwrap();
        let third = ledger.submit_vote(c, CANDIDATE_Y, CONSTITUENCY).unwrap();

        assert_eq!(second, first + 1);
        assert_eq!(third, second + 1);
    }

    #[test]
    fn aborted_transactions_leave_no_trace() {
        let (mut ledger, owner, [a, _, _]) = active_ledger();

        // Force the registry notification to fail after the booth's local
        // writes: point the registry at a foreign caller identity.
        ledger
            .rotate_registry_caller(owner, Authority::random())
            .unwrap();

        let snapshot = ledger.controller().clone();
        let events_before = ledger.events().len();

        assert!(matches!(
            ledger.submit_vote(a, CANDIDATE_X, CONSTITUENCY),
            Err(Error::Authorization(_))
        ));

        // No vote record, no tally bump, no submission flag, no event: the
        // committed state is exactly the pre-transaction snapshot.
        assert_eq!(ledger.controller(), &snapshot);
        assert_eq!(ledger.events().len(), events_before);
        assert!(!ledger.has_submitted(&a));
        assert!(ledger.is_eligible(&a));
    }

    #[test]
    fn failed_batch_registers_nothing() {
        let config = ElectionConfig::example();
        let owner = config.owner();
        let mut ledger = ElectionLedger::with_clock(config, LedgerClock::manual(nine_am()));

        // The middle slot duplicates the first: the whole batch must abort.
        assert!(ledger
            .batch_register_candidates(owner, &[(1, 1), (1, 1), (2, 1)])
            .is_err());
        assert!(!ledger.is_candidate_valid(1, 1));
        assert!(!ledger.is_candidate_valid(1, 2));
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn tallies_and_results_stay_sealed_early() {
        let (mut ledger, owner, [a, _, _]) = active_ledger();
        ledger.submit_vote(a, CANDIDATE_X, CONSTITUENCY).unwrap();

        // Voting still open: counts are sealed.
        assert!(matches!(
            ledger.vote_count(CANDIDATE_X),
            Err(Error::Phase(_))
        ));

        ledger.close_election(owner).unwrap();
        assert_eq!(ledger.vote_count(CANDIDATE_X).unwrap(), 1);

        // Closed but not finalized: results are sealed.
        assert!(matches!(
            ledger.candidate_result(CANDIDATE_X),
            Err(Error::Consistency(_))
        ));
        assert!(matches!(
            ledger.constituency_results(&[CONSTITUENCY]),
            Err(Error::Consistency(_))
        ));
    }

    #[test]
    fn tally_mismatch_aborts_the_whole_finalization() {
        let (mut ledger, owner, [a, b, _]) = active_ledger();
        ledger.submit_vote(a, CANDIDATE_X, CONSTITUENCY).unwrap();
        ledger.submit_vote(b, CANDIDATE_Y, CONSTITUENCY).unwrap();
        ledger.close_election(owner).unwrap();

        assert!(matches!(
            ledger.tally_and_finalize(
                owner,
                &[CONSTITUENCY],
                &[vec![CANDIDATE_X, CANDIDATE_Y]],
                &[5],
            ),
            Err(Error::Consistency(_))
        ));
        // The failed transaction tallied and finalized nothing.
        assert!(!ledger.controller().tallier().is_tallied(CONSTITUENCY));
        assert_eq!(ledger.phase(), ElectionPhase::Closed);
        assert!(!ledger.summary().results_finalized);

        ledger
            .tally_and_finalize(
                owner,
                &[CONSTITUENCY],
                &[vec![CANDIDATE_X, CANDIDATE_Y]],
                &[2],
            )
            .unwrap();
        assert_eq!(ledger.phase(), ElectionPhase::Finalized);
    }

    #[test]
    fn ties_surface_in_results_and_events() {
        let (mut ledger, owner, [a, b, _]) = active_ledger();
        ledger.submit_vote(a, CANDIDATE_X, CONSTITUENCY).unwrap();
        ledger.submit_vote(b, CANDIDATE_Y, CONSTITUENCY).unwrap();
        ledger.close_election(owner).unwrap();
        ledger
            .tally_and_finalize(
                owner,
                &[CONSTITUENCY],
                &[vec![CANDIDATE_X, CANDIDATE_Y]],
                &[2],
            )
            .unwrap();

        let result = ledger.constituency_result(CONSTITUENCY).unwrap();
        assert_eq!(result.winner, None);
        assert!(result.is_tied);
        assert_eq!(result.winner_vote_count, 1);

        assert!(ledger.events().iter().any(|sealed| matches!(
            sealed.event,
            LedgerEvent::TieDetected {
                constituency_id: CONSTITUENCY,
                top_vote_count: 1,
            }
        )));
    }

    #[test]
    fn no_event_correlates_a_voter_with_a_candidate() {
        let (mut ledger, owner, [a, b, c]) = active_ledger();
        ledger.submit_vote(a, CANDIDATE_X, CONSTITUENCY).unwrap();
        ledger.submit_vote(b, CANDIDATE_X, CONSTITUENCY).unwrap();
        ledger.submit_vote(c, CANDIDATE_Y, CONSTITUENCY).unwrap();
        ledger.close_election(owner).unwrap();
        ledger
            .tally_and_finalize(
                owner,
                &[CONSTITUENCY],
                &[vec![CANDIDATE_X, CANDIDATE_Y]],
                &[3],
            )
            .unwrap();

        let mut registration_sequences = HashSet::new();
        let mut cast_sequences = HashSet::new();
        for sealed in ledger.events() {
            match sealed.event {
                // The only events carrying a voter hash are registrations,
                // and they carry no candidate data.
                LedgerEvent::VoterRegistered { voter_hash, .. } => {
                    assert!([a, b, c].contains(&voter_hash));
                    registration_sequences.insert(sealed.sequence);
                }
                // Vote-cast events have no voter hash field at all.
                LedgerEvent::VoteCast { .. } => {
                    cast_sequences.insert(sealed.sequence);
                }
                _ => {}
            }
        }
        assert_eq!(cast_sequences.len(), 3);
        // Registrations and casts commit in separate transactions, so even
        // sequence numbers cannot link a voter to a ballot.
        assert!(registration_sequences.is_disjoint(&cast_sequences));
    }

    #[test]
    fn voting_status_tracks_the_window() {
        let (ledger, _, _) = ready_ledger();
        let status = ledger.voting_status();
        assert!(!status.is_open);
        assert_eq!(status.start, None);

        let (ledger, _, _) = active_ledger();
        let status = ledger.voting_status();
        assert!(status.is_open);
        assert_eq!(status.start, Some(ten_am()));
        assert_eq!(status.end, Some(eleven_am()));
        assert_eq!(status.now, ten_am() + Duration::minutes(5));
    }

    #[test]
    fn votes_outside_the_window_are_rejected() {
        let (mut ledger, owner, [a, _, _]) = ready_ledger();
        ledger.start_election(owner, ten_am(), eleven_am()).unwrap();

        // Still 09:00: the window has not opened.
        assert!(matches!(
            ledger.submit_vote(a, CANDIDATE_X, CONSTITUENCY),
            Err(Error::Phase(_))
        ));

        ledger.clock_mut().set(eleven_am() + Duration::seconds(1));
        assert!(matches!(
            ledger.submit_vote(a, CANDIDATE_X, CONSTITUENCY),
            Err(Error::Phase(_))
        ));
    }

    #[test]
    fn start_election_validates_the_window() {
        let (mut ledger, owner, _) = ready_ledger();

        assert!(matches!(
            ledger.start_election(owner, eleven_am(), ten_am()),
            Err(Error::Validation(_))
        ));
        // 08:00 start is already in the past at 09:00.
        assert!(matches!(
            ledger.start_election(owner, nine_am() - Duration::hours(1), ten_am()),
            Err(Error::Validation(_))
        ));
        assert_eq!(ledger.phase(), ElectionPhase::Ready);
    }
}
