mod controller;
mod phase;
mod summary;

pub use controller::ElectionController;
pub use phase::{ElectionPhase, PhaseTransition};
pub use summary::ElectionSummary;
