//! Deterministic, tie-aware result aggregation behind a finalization latch.
//!
//! Each constituency is tallied at most once from the booth's sealed counts,
//! and nothing is readable until the irreversible global finalization step.

mod result_core;
pub use result_core::{CandidateResult, ConstituencyResult};

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ledger::{LedgerEvent, TxContext};
use crate::model::booth::VotingBooth;
use crate::model::{CandidateId, ConstituencyId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsTallier {
    results_finalized: bool,
    finalized_at: Option<DateTime<Utc>>,
    constituency_results: HashMap<ConstituencyId, ConstituencyResult>,
    candidate_results: HashMap<CandidateId, CandidateResult>,
}

impl ResultsTallier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally one constituency from the booth's counts.
    ///
    /// `expected_total > 0` asserts the computed total exactly; a mismatch
    /// aborts the whole tally and the constituency stays untallied. A zero
    /// `expected_total` *disables* the check entirely, it does not assert
    /// "zero votes". Callers wanting the latter cannot express it; pass the
    /// real expected count whenever one is known.
    pub fn tally_constituency(
        &mut self,
        booth: &VotingBooth,
        constituency_id: ConstituencyId,
        candidate_ids: &[CandidateId],
        expected_total: u64,
        ctx: &mut TxContext,
    ) -> Result<()> {
        if self.results_finalized {
            return Err(Error::Consistency(
                "results are already finalized".to_string(),
            ));
        }
        if self.constituency_results.contains_key(&constituency_id) {
            return Err(Error::Consistency(format!(
                "constituency {constituency_id} has already been tallied"
            )));
        }
        if booth.is_open() {
            return Err(Error::Phase(
                "cannot tally while voting is open".to_string(),
            ));
        }
        if candidate_ids.is_empty() {
            return Err(Error::Validation(
                "candidate list must not be empty".to_string(),
            ));
        }

        let mut counts = Vec::with_capacity(candidate_ids.len());
        let mut total = 0u64;
        for &candidate_id in candidate_ids {
            let count = booth.vote_count(candidate_id)?;
            counts.push((candidate_id, count));
            total += count;
        }

        if expected_total > 0 && total != expected_total {
            return Err(Error::Consistency(format!(
                "tally mismatch for constituency {constituency_id}: counted {total}, expected {expected_total}"
            )));
        }

        // Two passes on purpose: find the maximum, then count how many
        // candidates hold it. A single pass that tracks "the" leader can
        // misclassify a tie as a win.
        let top_count = counts
            .iter()
            .map(|&(_, count)| count)
            .max()
            .expect("candidate list is non-empty");
        let holders = counts
            .iter()
            .filter(|&&(_, count)| count == top_count)
            .count();

        let is_tied = holders > 1;
        let winner = if is_tied {
            None
        } else {
            counts
                .iter()
                .find(|&&(_, count)| count == top_count)
                .map(|&(candidate_id, _)| candidate_id)
        };

        for &(candidate_id, vote_count) in &counts {
            self.candidate_results.insert(
                candidate_id,
                CandidateResult {
                    candidate_id,
                    constituency_id,
                    vote_count,
                },
            );
        }
        self.constituency_results.insert(
            constituency_id,
            ConstituencyResult {
                constituency_id,
                winner,
                winner_vote_count: top_count,
                is_tied,
                total_votes: total,
                tallied_at: ctx.now(),
            },
        );

        match winner {
            Some(candidate_id) => {
                ctx.emit(LedgerEvent::WinnerDeclared {
                    constituency_id,
                    candidate_id,
                    vote_count: top_count,
                });
                info!(
                    "constituency {constituency_id}: candidate {candidate_id} wins with {top_count} of {total} votes"
                );
            }
            None => {
                ctx.emit(LedgerEvent::TieDetected {
                    constituency_id,
                    top_vote_count: top_count,
                });
                info!("constituency {constituency_id}: tie at {top_count} votes, no winner");
            }
        }
        Ok(())
    }

    /// Publish everything tallied so far. Callable once; irreversible.
    ///
    /// The tallier does not know which constituencies were *intended*; the
    /// controller's orchestration is responsible for tallying all of them
    /// before calling this.
    pub fn finalize_results(&mut self, ctx: &mut TxContext) -> Result<()> {
        if self.results_finalized {
            return Err(Error::Consistency(
                "results are already finalized".to_string(),
            ));
        }
        self.results_finalized = true;
        self.finalized_at = Some(ctx.now());
        ctx.emit(LedgerEvent::ResultsFinalized);
        info!(
            "results finalized across {} constituencies",
            self.constituency_results.len()
        );
        Ok(())
    }

    pub fn constituency_result(
        &self,
        constituency_id: ConstituencyId,
    ) -> Result<&ConstituencyResult> {
        self.require_finalized()?;
        self.constituency_results
            .get(&constituency_id)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "constituency {constituency_id} was never tallied"
                ))
            })
    }

    pub fn candidate_result(&self, candidate_id: CandidateId) -> Result<&CandidateResult> {
        self.require_finalized()?;
        self.candidate_results.get(&candidate_id).ok_or_else(|| {
            Error::Validation(format!("candidate {candidate_id} was never tallied"))
        })
    }

    /// Batch read of several constituencies.
    pub fn constituency_results(
        &self,
        constituency_ids: &[ConstituencyId],
    ) -> Result<Vec<&ConstituencyResult>> {
        constituency_ids
            .iter()
            .map(|&constituency_id| self.constituency_result(constituency_id))
            .collect()
    }

    /// All candidate results for one constituency.
    pub fn candidate_results_for(
        &self,
        constituency_id: ConstituencyId,
    ) -> Result<Vec<&CandidateResult>> {
        // Also checks finalization and that the constituency was tallied.
        self.constituency_result(constituency_id)?;
        Ok(self
            .candidate_results
            .values()
            .filter(|result| result.constituency_id == constituency_id)
            .collect())
    }

    pub fn is_finalized(&self) -> bool {
        self.results_finalized
    }

    pub fn finalized_at(&self) -> Option<DateTime<Utc>> {
        self.finalized_at
    }

    pub fn is_tallied(&self, constituency_id: ConstituencyId) -> bool {
        self.constituency_results.contains_key(&constituency_id)
    }

    fn require_finalized(&self) -> Result<()> {
        if !self.results_finalized {
            return Err(Error::Consistency(
                "results are not finalized".to_string(),
            ));
        }
        Ok(())
    }
}
