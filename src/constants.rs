//! Central configuration constants for bitsplit-bot.
//!
//! Tunable limits, cadences and execution parameters live here so business logic
//! never carries magic numbers.

use std::time::Duration;

// =============================================================================
// STRATEGY CONSTANTS
// =============================================================================

/// Upper bound on the number of slots in one grid.
pub const MAX_SLOTS: u32 = 50;

/// Number of entries kept by the activity log (newest first).
pub const ACTIVITY_LOG_CAPACITY: usize = 100;

// =============================================================================
// EXECUTION CONSTANTS
// =============================================================================

/// Slippage applied to the mid price when sending an IOC order as a market order (5%).
pub const MARKET_ORDER_SLIPPAGE: f64 = 0.05;

/// Hyperliquid quotes prices with 5 significant figures.
pub const PRICE_SIG_FIGS: u32 = 5;

// =============================================================================
// ENGINE TIMER INTERVALS
// =============================================================================

/// Cadence of strategy steps (1 second)
pub const STEP_INTERVAL: Duration = Duration::from_secs(1);

/// Interval for broadcasting status summary updates (5 seconds)
pub const STATUS_SUMMARY_INTERVAL: Duration = Duration::from_secs(5);

/// Size of the cached activity history sent to new WebSocket clients
pub const ACTIVITY_HISTORY_CACHE: usize = 50;
