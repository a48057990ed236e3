use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{CandidateId, ConstituencyId};

/// Final per-candidate count, written once when the candidate's constituency
/// is tallied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub candidate_id: CandidateId,
    pub constituency_id: ConstituencyId,
    pub vote_count: u64,
}

/// Final outcome for one constituency, written once.
///
/// `winner` is `None` when the top count is shared: ties are reported, never
/// broken by id order, registration order, or anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstituencyResult {
    pub constituency_id: ConstituencyId,
    pub winner: Option<CandidateId>,
    pub winner_vote_count: u64,
    pub is_tied: bool,
    pub total_votes: u64,
    pub tallied_at: DateTime<Utc>,
}
