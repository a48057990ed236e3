use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Phases in the election lifecycle.
///
/// Travel is strictly forward, one step at a time; no phase is ever
/// revisited. Encoded as its wire integer so external layers see the same
/// numeric phase the summary reports.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize_repr, Deserialize_repr,
)]
#[repr(u8)]
pub enum ElectionPhase {
    /// Voter and candidate registration.
    Setup = 0,
    /// Registration closed, waiting for the voting window.
    Ready = 1,
    /// Voting open.
    Active = 2,
    /// Voting closed, tallies readable.
    Closed = 3,
    /// Results tallied and published. Terminal.
    Finalized = 4,
}

impl ElectionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Setup => "Setup",
            Self::Ready => "Ready",
            Self::Active => "Active",
            Self::Closed => "Closed",
            Self::Finalized => "Finalized",
        }
    }
}

impl Display for ElectionPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One step of the phase machine, with the ledger time it was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: ElectionPhase,
    pub to: ElectionPhase,
    pub at: DateTime<Utc>,
}
