use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ConstituencyId;

/// Core eligibility data for one voter, keyed in the registry by their
/// identity hash. Records are created at registration and never deleted;
/// `has_voted` moves from `false` to `true` at most once and never back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    pub is_registered: bool,
    pub has_voted: bool,
    pub constituency_id: ConstituencyId,
    pub registered_at: DateTime<Utc>,
    pub voted_at: Option<DateTime<Utc>>,
}

impl VoterRecord {
    pub fn new(constituency_id: ConstituencyId, registered_at: DateTime<Utc>) -> Self {
        Self {
            is_registered: true,
            has_voted: false,
            constituency_id,
            registered_at,
            voted_at: None,
        }
    }
}

/// Running registration/turnout counters for one constituency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstituencyCounters {
    pub registered: u64,
    pub voted: u64,
}
