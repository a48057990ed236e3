//! Ledger-resident election core.
//!
//! Records an election's lifecycle and tally on an append-only,
//! transaction-ordered ledger: a voter eligibility registry, a
//! privacy-preserving voting booth, a tie-aware results tallier, and the
//! phase controller that sequences them. Every mutating call is atomic: it
//! either fully applies or leaves no trace. No event, read or log ever
//! correlates a voter with a candidate.
//!
//! The identity layer (biometric verification producing [`VoterHash`]es), the
//! REST surface and the audit database sit outside this crate; they interact
//! with the core only through [`ElectionLedger`]'s entry points and its
//! sealed event stream.

pub mod config;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod model;

pub use config::ElectionConfig;
pub use error::{Error, Result};
pub use identity::{IdentityKey, VoterHash};
pub use ledger::{ElectionLedger, LedgerClock, LedgerEvent, SealedEvent};
pub use model::auth::Authority;
pub use model::election::{ElectionPhase, ElectionSummary};
pub use model::{CandidateId, ConstituencyId};
