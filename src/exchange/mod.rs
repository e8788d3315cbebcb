//! Exchange collaborators consumed by the strategy engine.
//!
//! The engine only sees these traits. A concrete session (Hyperliquid) or the
//! in-memory test mock implements them.

pub mod hyperliquid;
pub mod market;
#[cfg(test)]
pub mod mock;

use crate::error::{ExchangeError, ExchangeResult};
use async_trait::async_trait;

/// Result of a market buy as reported by the executor.
///
/// Fields are `None` when the venue does not report them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BuyFill {
    pub executed_price: Option<f64>,
    pub executed_quantity: Option<f64>,
}

/// Result of a market sell as reported by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SellFill {
    pub executed_price: Option<f64>,
    pub executed_quantity: Option<f64>,
}

/// Supplies the last traded price of a symbol.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn current_price(&self, symbol: &str) -> ExchangeResult<f64>;
}

/// Places market orders.
///
/// Venues differ in how a market buy is denominated. Implementations override
/// whichever of the two buy methods they support; the other reports `Unsupported`.
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    /// Market buy spending `cost` of the quote asset.
    async fn market_buy_by_cost(&self, _symbol: &str, _cost: f64) -> ExchangeResult<BuyFill> {
        Err(ExchangeError::Unsupported("market buy by cost"))
    }

    /// Market buy of `quantity` base units.
    async fn market_buy_by_quantity(
        &self,
        _symbol: &str,
        _quantity: f64,
    ) -> ExchangeResult<BuyFill> {
        Err(ExchangeError::Unsupported("market buy by quantity"))
    }

    /// Market sell of `quantity` base units.
    async fn market_sell_by_quantity(&self, symbol: &str, quantity: f64)
        -> ExchangeResult<SellFill>;
}

/// Rejects prices that cannot drive the strategy.
pub fn validate_price(symbol: &str, price: f64) -> ExchangeResult<f64> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(ExchangeError::NoPrice(format!(
            "invalid price {} for {}",
            price, symbol
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SellOnly;

    #[async_trait]
    impl OrderExecutor for SellOnly {
        async fn market_sell_by_quantity(
            &self,
            _symbol: &str,
            _quantity: f64,
        ) -> ExchangeResult<SellFill> {
            Ok(SellFill::default())
        }
    }

    #[tokio::test]
    async fn test_default_buys_are_unsupported() {
        let exec = SellOnly;
        assert!(matches!(
            exec.market_buy_by_cost("BTC", 10.0).await,
            Err(ExchangeError::Unsupported(_))
        ));
        assert!(matches!(
            exec.market_buy_by_quantity("BTC", 1.0).await,
            Err(ExchangeError::Unsupported(_))
        ));
    }

    #[test]
    fn test_validate_price() {
        assert_eq!(validate_price("BTC", 10.0), Ok(10.0));
        assert!(validate_price("BTC", 0.0).is_err());
        assert!(validate_price("BTC", f64::NAN).is_err());
        assert!(validate_price("BTC", f64::INFINITY).is_err());
    }
}
