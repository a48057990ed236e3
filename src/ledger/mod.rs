//! The ledger substrate: ordered atomic transactions, block time, commit
//! sequencing and the audit event stream.

mod clock;
mod counter;
mod event;
mod machine;

pub use clock::LedgerClock;
pub use counter::Counter;
pub use event::{EventLog, LedgerEvent, SealedEvent};
pub use machine::{ElectionLedger, TxContext};
