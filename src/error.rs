use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every way a ledger transaction can be rejected.
///
/// All variants are detected synchronously by precondition checks at the top of
/// the mutating operations; any of them aborts the whole transaction, leaving
/// ledger state untouched. The message names the precondition that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Operation attempted outside its permitted election phase or voting window.
    #[error("phase violation: {0}")]
    Phase(String),
    /// Caller lacks the required role or authorized address.
    #[error("authorization violation: {0}")]
    Authorization(String),
    /// Voter not registered, already voted, or already submitted.
    #[error("eligibility violation: {0}")]
    Eligibility(String),
    /// Malformed or duplicate registration, invalid time window, unknown
    /// candidate, or mismatched argument lengths.
    #[error("validation violation: {0}")]
    Validation(String),
    /// Tally totals disagree, or a re-tally/re-finalize/unfinalized read.
    #[error("consistency violation: {0}")]
    Consistency(String),
}
