pub mod server;
pub mod types;

pub use server::StatusBroadcaster;
pub use types::{ActivityEvent, MarketEvent, StrategySummary, SystemInfo, WSEvent};
