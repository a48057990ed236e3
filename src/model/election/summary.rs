use serde::Serialize;

use super::phase::ElectionPhase;

/// One-shot overview of the whole election, recomputed from the owned
/// modules on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElectionSummary {
    pub election_id: u64,
    pub election_name: String,
    pub phase: ElectionPhase,
    pub total_registered: u64,
    pub total_voted: u64,
    /// Turnout as integer basis points (×10 000).
    pub turnout_basis_points: u64,
    pub voting_is_open: bool,
    pub results_finalized: bool,
}
