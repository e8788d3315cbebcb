use crate::engine::EngineState;
use crate::strategy::slot::SlotStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Config error: {0}")]
    ConfigError(#[from] std::io::Error),
    #[error("Parsing error: {0}")]
    ParsingError(#[from] toml::de::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Errors raised by the strategy core.
///
/// Only `InvalidConfig` and `InvalidTransition` abort the operation that raised them;
/// price and order failures are absorbed into the activity log by the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Price unavailable: {0}")]
    PriceUnavailable(String),

    #[error("Order failed: {0}")]
    OrderFailure(String),

    #[error("Invalid transition: cannot {action} slot {slot_id} while {status}")]
    InvalidTransition {
        slot_id: u32,
        status: SlotStatus,
        action: &'static str,
    },

    #[error("Unknown slot: {0}")]
    UnknownSlot(u32),

    #[error("Engine is not active (state: {0})")]
    NotActive(EngineState),
}

/// Failures reported by the exchange collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("Not connected")]
    NotConnected,

    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("No price: {0}")]
    NoPrice(String),
}

impl From<hyperliquid_rust_sdk::Error> for ExchangeError {
    fn from(err: hyperliquid_rust_sdk::Error) -> Self {
        ExchangeError::Transport(err.to_string())
    }
}

/// Result type for strategy operations
pub type StrategyResult<T> = std::result::Result<T, StrategyError>;

/// Result type for exchange operations
pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;
