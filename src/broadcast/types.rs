use crate::strategy::slot::SlotView;
use serde::{Deserialize, Serialize};

// ============================================================
// WebSocket Event Types
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "data")]
pub enum WSEvent {
    /// Strategy configuration (sent on connect)
    #[serde(rename = "config")]
    Config(serde_json::Value),

    /// Connection details (network, mode)
    #[serde(rename = "info")]
    Info(SystemInfo),

    /// Strategy summary (high-level metrics)
    #[serde(rename = "summary")]
    Summary(StrategySummary),

    /// Slot table for the dashboard
    #[serde(rename = "slots")]
    Slots(Vec<SlotView>),

    /// New activity log entry
    #[serde(rename = "activity")]
    Activity(ActivityEvent),

    /// Market price update
    #[serde(rename = "market_update")]
    MarketUpdate(MarketEvent),

    /// Error notification
    #[serde(rename = "error")]
    Error(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub network: String,
    pub exchange: String,
    pub can_trade: bool,
}

// ============================================================
// Strategy Summary (High-level metrics)
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategySummary {
    pub symbol: String,
    pub state: String, // "Unconfigured", "Active", "Inactive"
    pub dry_run: bool,
    pub price: Option<f64>,
    pub uptime: String, // Human-readable uptime, e.g. "2d 14h 30m"

    // Slots
    pub slot_count: u32,
    pub bought_slots: u32,

    // Position
    pub position_size: f64, // Base asset held across bought slots
    pub invested: f64,      // Cost basis of open slots

    // PnL
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub roundtrips: u32, // Completed buy→sell cycles
}

// ============================================================
// Activity and Market Events
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityEvent {
    pub timestamp: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketEvent {
    pub price: f64,
}
