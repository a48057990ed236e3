use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::VoterHash;
use crate::model::election::ElectionPhase;
use crate::model::{CandidateId, ConstituencyId};

/// A notification emitted by a successful mutating call.
///
/// Events are the sole channel through which the external audit layer observes
/// the core. `VoteCast` deliberately carries no voter hash: nothing emitted by
/// the ledger may ever correlate a voter with a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    VoterRegistered {
        voter_hash: VoterHash,
        constituency_id: ConstituencyId,
    },
    CandidateRegistered {
        candidate_id: CandidateId,
        constituency_id: ConstituencyId,
    },
    RegistrationClosed,
    VotingOpened {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    VotingClosed {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    VoteCast {
        candidate_id: CandidateId,
        constituency_id: ConstituencyId,
    },
    TieDetected {
        constituency_id: ConstituencyId,
        top_vote_count: u64,
    },
    WinnerDeclared {
        constituency_id: ConstituencyId,
        candidate_id: CandidateId,
        vote_count: u64,
    },
    PhaseChanged {
        from: ElectionPhase,
        to: ElectionPhase,
    },
    ResultsFinalized,
}

/// An event sealed into the ledger: the notification plus the commit sequence
/// and ledger time of the transaction that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedEvent {
    pub sequence: u64,
    pub at: DateTime<Utc>,
    pub event: LedgerEvent,
}

/// Append-only log of sealed events, in commit order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<SealedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seal a committed transaction's staged events into the log.
    pub(crate) fn seal(&mut self, sequence: u64, at: DateTime<Utc>, staged: Vec<LedgerEvent>) {
        self.events.extend(
            staged
                .into_iter()
                .map(|event| SealedEvent { sequence, at, event }),
        );
    }

    pub fn all(&self) -> &[SealedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
