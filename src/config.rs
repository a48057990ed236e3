use serde::Deserialize;

use crate::model::auth::Authority;

/// Deployment configuration for one election, fixed at construction.
///
/// The owning authority is the single identity allowed to drive the election
/// forward; there is no ambient owner state anywhere else.
#[derive(Debug, Clone, Deserialize)]
pub struct ElectionConfig {
    election_id: u64,
    election_name: String,
    owner: Authority,
}

impl ElectionConfig {
    pub fn new(election_id: u64, election_name: impl Into<String>, owner: Authority) -> Self {
        Self {
            election_id,
            election_name: election_name.into(),
            owner,
        }
    }

    /// Identifier reported in summaries and events.
    pub fn election_id(&self) -> u64 {
        self.election_id
    }

    /// Human-readable election name.
    pub fn election_name(&self) -> &str {
        &self.election_name
    }

    /// The deploying authority.
    pub fn owner(&self) -> Authority {
        self.owner
    }
}
