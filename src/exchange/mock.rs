//! In-memory scripted exchange for tests.

use super::{validate_price, BuyFill, OrderExecutor, PriceFeed, SellFill};
use crate::error::{ExchangeError, ExchangeResult};
use crate::model::OrderSide;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

/// An order call received by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedOrder {
    pub symbol: String,
    pub side: OrderSide,
    /// Quote cost for cost-based buys, base quantity otherwise
    pub amount: f64,
    pub by_cost: bool,
}

#[derive(Debug)]
struct MockState {
    price: Option<f64>,
    fail_buys: bool,
    fail_sells: bool,
    supports_cost_buy: bool,
    report_fills: bool,
    fill_price: Option<f64>,
    sell_fill_quantity: Option<f64>,
    orders: Vec<RecordedOrder>,
    price_requests: u32,
}

/// Scripted exchange: settable price, switchable failures, recorded orders.
///
/// Clones share state, so a test can keep a handle while the engine owns another.
#[derive(Debug, Clone)]
pub struct MockExchange {
    state: Arc<Mutex<MockState>>,
}

impl MockExchange {
    pub fn new(price: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                price: Some(price),
                fail_buys: false,
                fail_sells: false,
                supports_cost_buy: true,
                report_fills: true,
                fill_price: None,
                sell_fill_quantity: None,
                orders: Vec::new(),
                price_requests: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned lock only happens after a test already panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_price(&self, price: f64) {
        self.lock().price = Some(price);
    }

    /// Makes the next price requests fail.
    pub fn clear_price(&self) {
        self.lock().price = None;
    }

    pub fn set_fail_buys(&self, fail: bool) {
        self.lock().fail_buys = fail;
    }

    pub fn set_fail_sells(&self, fail: bool) {
        self.lock().fail_sells = fail;
    }

    /// Toggles cost-denominated market buys; when off the mock only buys by quantity.
    pub fn set_supports_cost_buy(&self, supported: bool) {
        self.lock().supports_cost_buy = supported;
    }

    /// When off, fills come back without price or quantity.
    pub fn set_report_fills(&self, report: bool) {
        self.lock().report_fills = report;
    }

    /// Fill price different from the quoted price, to simulate slippage.
    pub fn set_fill_price(&self, price: Option<f64>) {
        self.lock().fill_price = price;
    }

    /// Sell fills report this size instead of the requested one, to simulate lot rounding.
    pub fn set_sell_fill_quantity(&self, quantity: Option<f64>) {
        self.lock().sell_fill_quantity = quantity;
    }

    pub fn orders(&self) -> Vec<RecordedOrder> {
        self.lock().orders.clone()
    }

    pub fn price_requests(&self) -> u32 {
        self.lock().price_requests
    }

    fn execution_price(state: &MockState) -> ExchangeResult<f64> {
        state
            .fill_price
            .or(state.price)
            .ok_or_else(|| ExchangeError::Rejected("no market price".into()))
    }
}

#[async_trait]
impl PriceFeed for MockExchange {
    async fn current_price(&self, symbol: &str) -> ExchangeResult<f64> {
        let mut state = self.lock();
        state.price_requests += 1;
        match state.price {
            Some(price) => validate_price(symbol, price),
            None => Err(ExchangeError::Transport("Mock price feed down".into())),
        }
    }
}

#[async_trait]
impl OrderExecutor for MockExchange {
    async fn market_buy_by_cost(&self, symbol: &str, cost: f64) -> ExchangeResult<BuyFill> {
        let mut state = self.lock();
        if !state.supports_cost_buy {
            return Err(ExchangeError::Unsupported("market buy by cost"));
        }
        if state.fail_buys {
            return Err(ExchangeError::Rejected("Mock buy failure".into()));
        }
        let px = Self::execution_price(&state)?;
        state.orders.push(RecordedOrder {
            symbol: symbol.to_string(),
            side: OrderSide::Buy,
            amount: cost,
            by_cost: true,
        });
        Ok(if state.report_fills {
            BuyFill {
                executed_price: Some(px),
                executed_quantity: Some(cost / px),
            }
        } else {
            BuyFill::default()
        })
    }

    async fn market_buy_by_quantity(&self, symbol: &str, quantity: f64) -> ExchangeResult<BuyFill> {
        let mut state = self.lock();
        if state.fail_buys {
            return Err(ExchangeError::Rejected("Mock buy failure".into()));
        }
        let px = Self::execution_price(&state)?;
        state.orders.push(RecordedOrder {
            symbol: symbol.to_string(),
            side: OrderSide::Buy,
            amount: quantity,
            by_cost: false,
        });
        Ok(if state.report_fills {
            BuyFill {
                executed_price: Some(px),
                executed_quantity: Some(quantity),
            }
        } else {
            BuyFill::default()
        })
    }

    async fn market_sell_by_quantity(
        &self,
        symbol: &str,
        quantity: f64,
    ) -> ExchangeResult<SellFill> {
        let mut state = self.lock();
        if state.fail_sells {
            return Err(ExchangeError::Rejected("Mock sell failure".into()));
        }
        let px = Self::execution_price(&state)?;
        state.orders.push(RecordedOrder {
            symbol: symbol.to_string(),
            side: OrderSide::Sell,
            amount: quantity,
            by_cost: false,
        });
        let quantity = state.sell_fill_quantity.unwrap_or(quantity);
        Ok(if state.report_fills {
            SellFill {
                executed_price: Some(px),
                executed_quantity: Some(quantity),
            }
        } else {
            SellFill::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_price_feed_script() {
        let mock = MockExchange::new(100.0);
        assert_eq!(mock.current_price("BTC").await, Ok(100.0));

        mock.clear_price();
        assert!(mock.current_price("BTC").await.is_err());
        assert_eq!(mock.price_requests(), 2);
    }

    #[tokio::test]
    async fn test_cost_buy_records_order() {
        let mock = MockExchange::new(50.0);
        let fill = mock.market_buy_by_cost("BTC", 100.0).await.unwrap();
        assert_eq!(fill.executed_price, Some(50.0));
        assert_eq!(fill.executed_quantity, Some(2.0));

        let orders = mock.orders();
        assert_eq!(orders.len(), 1);
        assert!(orders[0].by_cost);
    }

    #[tokio::test]
    async fn test_failures_do_not_record() {
        let mock = MockExchange::new(50.0);
        mock.set_fail_sells(true);
        assert!(mock.market_sell_by_quantity("BTC", 1.0).await.is_err());
        assert!(mock.orders().is_empty());
    }
}
