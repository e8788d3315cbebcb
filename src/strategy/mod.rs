//! BitSplit slot model: target planning, slot lifecycle and the activity log.

pub mod activity;
pub mod ledger;
pub mod planner;
pub mod slot;

pub use activity::{ActivityLog, LogEntry};
pub use ledger::SlotLedger;
pub use planner::plan_targets;
pub use slot::{Slot, SlotStatus, SlotView};
