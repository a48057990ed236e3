//! Ledger-resident state: the four cooperating election modules and the
//! authorization values gating them.
//!
//! Each module exclusively owns and mutates its own tables; cross-module
//! effects happen only through the explicit calls wired up by the
//! [`election::ElectionController`].

pub mod auth;
pub mod booth;
pub mod election;
pub mod registry;
pub mod tallier;

/// Candidate identifier assigned by the admin workflow. Opaque to the core
/// beyond being positive.
pub type CandidateId = u32;

/// Constituency (voting district) identifier assigned by the admin workflow.
/// Opaque to the core beyond being positive.
pub type ConstituencyId = u32;
