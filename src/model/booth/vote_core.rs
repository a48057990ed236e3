use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{CandidateId, ConstituencyId};

/// A candidate standing in a constituency. Registered during setup and
/// immutable once voting opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateSlot {
    pub constituency_id: ConstituencyId,
    pub candidate_id: CandidateId,
}

impl CandidateSlot {
    pub fn new(candidate_id: CandidateId, constituency_id: ConstituencyId) -> Self {
        Self {
            constituency_id,
            candidate_id,
        }
    }
}

/// The ballot tying a voter to their choice.
///
/// This is the privacy boundary: the record never leaves the booth module,
/// and the existence of its key (`has_submitted`) is the only externally
/// observable fact about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct VoteRecord {
    pub candidate_id: CandidateId,
    pub constituency_id: ConstituencyId,
    pub cast_at: DateTime<Utc>,
    pub sequence: u64,
}

/// The window within which votes are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Snapshot of the booth's gate for status reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VotingStatus {
    pub is_open: bool,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
}
