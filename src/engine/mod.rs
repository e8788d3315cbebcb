//! BitSplit strategy engine.
//!
//! The engine owns the slot ledger and activity log of one configuration. Each
//! `step` fetches a price, evaluates every slot in id order and executes at most
//! one transition per slot, either simulated (dry run) or through the order
//! executor (live). Price and order failures are logged and retried naturally on
//! the next step.

pub mod runner;

use crate::broadcast::types::StrategySummary;
use crate::config::strategy::GridConfiguration;
use crate::error::{ExchangeError, StrategyError, StrategyResult};
use crate::exchange::{validate_price, BuyFill, OrderExecutor, PriceFeed};
use crate::logging::order_audit::OrderAuditLogger;
use crate::strategy::activity::ActivityLog;
use crate::strategy::ledger::SlotLedger;
use crate::strategy::slot::{SlotStatus, SlotView};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    Unconfigured,
    Active,
    Inactive,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Unconfigured => write!(f, "Unconfigured"),
            EngineState::Active => write!(f, "Active"),
            EngineState::Inactive => write!(f, "Inactive"),
        }
    }
}

/// What one step observed.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Slots were evaluated at this price
    Price(f64),
    /// The feed failed; no slot was evaluated
    NoPrice(String),
}

impl StepOutcome {
    pub fn price(&self) -> Option<f64> {
        match self {
            StepOutcome::Price(p) => Some(*p),
            StepOutcome::NoPrice(_) => None,
        }
    }
}

pub struct StrategyEngine {
    feed: Arc<dyn PriceFeed>,
    executor: Arc<dyn OrderExecutor>,
    audit_logger: Option<OrderAuditLogger>,

    config: Option<GridConfiguration>,
    state: EngineState,
    ledger: SlotLedger,
    activity: ActivityLog,

    last_price: Option<f64>,
    configured_at: Option<Instant>,
}

impl StrategyEngine {
    pub fn new(feed: Arc<dyn PriceFeed>, executor: Arc<dyn OrderExecutor>) -> Self {
        Self {
            feed,
            executor,
            audit_logger: None,
            config: None,
            state: EngineState::Unconfigured,
            ledger: SlotLedger::new(),
            activity: ActivityLog::new(),
            last_price: None,
            configured_at: None,
        }
    }

    pub fn with_audit_logger(mut self, audit_logger: Option<OrderAuditLogger>) -> Self {
        self.audit_logger = audit_logger;
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> Option<&GridConfiguration> {
        self.config.as_ref()
    }

    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    pub fn ledger(&self) -> &SlotLedger {
        &self.ledger
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Applies a new configuration and (re)enters `Active` with a fresh ledger.
    ///
    /// Allowed from every state. An invalid configuration leaves the engine untouched.
    pub fn configure(&mut self, config: GridConfiguration) -> StrategyResult<()> {
        config.validate()?;

        let mut ledger = SlotLedger::new();
        ledger.initialize(&config)?;

        if self.state != EngineState::Unconfigured {
            info!(
                "[BITSPLIT] Reconfiguring: discarding {} slots ({} bought)",
                self.ledger.len(),
                self.ledger.slots().iter().filter(|s| s.is_bought()).count()
            );
        }

        self.ledger = ledger;
        self.record(format!(
            "Strategy configured: {}, {} slots, dry run={}",
            config.symbol, config.slot_count, config.dry_run
        ));
        self.config = Some(config);
        self.state = EngineState::Active;
        self.configured_at = Some(Instant::now());
        Ok(())
    }

    /// Same as `configure`; kept as a separate name for callers switching a running grid.
    pub fn reconfigure(&mut self, config: GridConfiguration) -> StrategyResult<()> {
        self.configure(config)
    }

    /// Stops stepping. Slots keep their state until the next `configure`.
    pub fn stop(&mut self) -> StrategyResult<()> {
        if self.state != EngineState::Active {
            return Err(StrategyError::NotActive(self.state));
        }
        self.state = EngineState::Inactive;
        self.record("Strategy stopped");
        Ok(())
    }

    /// Runs one polling step. Callers must not overlap steps.
    pub async fn step(&mut self) -> StrategyResult<StepOutcome> {
        let config = match (&self.config, self.state) {
            (Some(config), EngineState::Active) => config.clone(),
            _ => return Err(StrategyError::NotActive(self.state)),
        };

        let fetched = self
            .feed
            .current_price(&config.symbol)
            .await
            .and_then(|price| validate_price(&config.symbol, price));
        let price = match fetched {
            Ok(price) => price,
            Err(e) => {
                self.record_failure(format!("Price unavailable for {}: {}", config.symbol, e));
                let reason = StrategyError::PriceUnavailable(e.to_string());
                return Ok(StepOutcome::NoPrice(reason.to_string()));
            }
        };
        self.last_price = Some(price);

        let slot_ids: Vec<u32> = self.ledger.slots().iter().map(|s| s.id()).collect();
        for slot_id in slot_ids {
            let status = match self.ledger.slot(slot_id) {
                Some(slot) => slot.status(),
                None => continue,
            };

            match status {
                SlotStatus::Ready => {
                    if self.slot_should_buy(slot_id, price) {
                        self.execute_buy(&config, slot_id, price).await?;
                    }
                }
                SlotStatus::Bought => {
                    self.ledger.update_unrealized(slot_id, price)?;
                    if self.slot_should_sell(slot_id, price) {
                        self.execute_sell(&config, slot_id, price).await?;
                    }
                }
            }
        }

        Ok(StepOutcome::Price(price))
    }

    /// Fetches the current price for display without touching any slot.
    pub async fn quote(&mut self) -> Option<f64> {
        let symbol = self.config.as_ref()?.symbol.clone();
        match self.feed.current_price(&symbol).await {
            Ok(price) => {
                self.last_price = Some(price);
                Some(price)
            }
            Err(e) => {
                debug!("[BITSPLIT] Quote for {} failed: {}", symbol, e);
                None
            }
        }
    }

    pub fn snapshot(&self) -> Vec<SlotView> {
        self.ledger.snapshot()
    }

    /// Formatted activity log, newest first.
    pub fn log_entries(&self) -> Vec<String> {
        self.activity.lines()
    }

    pub fn summary(&self) -> StrategySummary {
        let slots = self.ledger.slots();
        let bought: Vec<_> = slots.iter().filter(|s| s.is_bought()).collect();

        StrategySummary {
            symbol: self
                .config
                .as_ref()
                .map(|c| c.symbol.clone())
                .unwrap_or_default(),
            state: self.state.to_string(),
            dry_run: self.config.as_ref().map(|c| c.dry_run).unwrap_or(true),
            price: self.last_price,
            uptime: self
                .configured_at
                .map(|t| format_uptime(t.elapsed().as_secs()))
                .unwrap_or_default(),
            slot_count: slots.len() as u32,
            bought_slots: bought.len() as u32,
            position_size: bought.iter().map(|s| s.quantity()).sum(),
            invested: bought.iter().map(|s| s.buy_price() * s.quantity()).sum(),
            realized_pnl: self.ledger.realized_profit(),
            unrealized_pnl: self
                .last_price
                .map(|p| self.ledger.unrealized_profit(p))
                .unwrap_or(0.0),
            roundtrips: self.ledger.roundtrips(),
        }
    }

    // --- Private Methods ---

    fn slot_should_buy(&self, slot_id: u32, price: f64) -> bool {
        self.ledger
            .slot(slot_id)
            .is_some_and(|s| s.should_buy(price))
    }

    fn slot_should_sell(&self, slot_id: u32, price: f64) -> bool {
        self.ledger
            .slot(slot_id)
            .is_some_and(|s| s.should_sell(price))
    }

    fn record(&mut self, message: impl Into<String>) {
        let entry = self.activity.append(message);
        info!("[BITSPLIT] {}", entry.message);
    }

    fn record_failure(&mut self, message: impl Into<String>) {
        let entry = self.activity.append(message);
        warn!("[BITSPLIT] {}", entry.message);
    }

    async fn execute_buy(
        &mut self,
        config: &GridConfiguration,
        slot_id: u32,
        price: f64,
    ) -> StrategyResult<()> {
        let estimated_qty = config.investment_per_slot / price;

        if config.dry_run {
            self.ledger
                .apply_buy(slot_id, price, estimated_qty, config.target_return)?;
            let sell_target = price * (1.0 + config.target_return);
            self.record(format!(
                "[DRY RUN] BOUGHT Slot {} @ {} (target sell {})",
                slot_id,
                fmt_price(price),
                fmt_price(sell_target)
            ));
            return Ok(());
        }

        if let Some(logger) = &self.audit_logger {
            logger.log_req(
                &config.symbol,
                "Buy",
                slot_id,
                price,
                config.investment_per_slot,
                Some("cost".to_string()),
            );
        }

        match self
            .live_buy(&config.symbol, config.investment_per_slot, estimated_qty)
            .await
        {
            Ok(fill) => {
                // Executor-reported values win; otherwise fall back to the observed price
                let exec_price = fill.executed_price.filter(|p| *p > 0.0).unwrap_or(price);
                let exec_qty = fill
                    .executed_quantity
                    .filter(|q| *q > 0.0)
                    .unwrap_or(estimated_qty);

                self.ledger
                    .apply_buy(slot_id, exec_price, exec_qty, config.target_return)?;

                if let Some(logger) = &self.audit_logger {
                    logger.log_fill(&config.symbol, "Buy", slot_id, exec_price, exec_qty);
                }
                self.record(format!(
                    "[LIVE] BOUGHT Slot {} @ {} qty {:.8} (target sell {})",
                    slot_id,
                    fmt_price(exec_price),
                    exec_qty,
                    fmt_price(exec_price * (1.0 + config.target_return))
                ));
            }
            Err(e) => {
                if let Some(logger) = &self.audit_logger {
                    logger.log_fail(&config.symbol, "Buy", slot_id, &e.to_string());
                }
                self.record_failure(format!("[LIVE] BUY FAILED Slot {}: {}", slot_id, e));
            }
        }
        Ok(())
    }

    /// Cost-based buy first; quantity-based only when the venue cannot buy by cost.
    async fn live_buy(
        &self,
        symbol: &str,
        cost: f64,
        estimated_qty: f64,
    ) -> Result<BuyFill, ExchangeError> {
        match self.executor.market_buy_by_cost(symbol, cost).await {
            Err(ExchangeError::Unsupported(what)) => {
                debug!(
                    "[BITSPLIT] {} unsupported, buying {} {} by quantity",
                    what, estimated_qty, symbol
                );
                self.executor
                    .market_buy_by_quantity(symbol, estimated_qty)
                    .await
            }
            other => other,
        }
    }

    async fn execute_sell(
        &mut self,
        config: &GridConfiguration,
        slot_id: u32,
        price: f64,
    ) -> StrategyResult<()> {
        if config.dry_run {
            let profit = self.ledger.apply_sell(slot_id, price)?;
            self.record(format!(
                "[DRY RUN] SOLD Slot {} @ {} (profit {:.2})",
                slot_id,
                fmt_price(price),
                profit
            ));
            return Ok(());
        }

        let quantity = self
            .ledger
            .slot(slot_id)
            .map(|s| s.quantity())
            .ok_or(StrategyError::UnknownSlot(slot_id))?;

        if let Some(logger) = &self.audit_logger {
            logger.log_req(&config.symbol, "Sell", slot_id, price, quantity, None);
        }

        match self
            .executor
            .market_sell_by_quantity(&config.symbol, quantity)
            .await
        {
            Ok(fill) => {
                let exec_price = fill.executed_price.filter(|p| *p > 0.0).unwrap_or(price);
                let sold_qty = fill.executed_quantity.filter(|q| *q > 0.0);
                let profit = self
                    .ledger
                    .apply_sell_filled(slot_id, exec_price, sold_qty)?;

                if let Some(logger) = &self.audit_logger {
                    logger.log_fill(
                        &config.symbol,
                        "Sell",
                        slot_id,
                        exec_price,
                        sold_qty.unwrap_or(quantity),
                    );
                }
                self.record(format!(
                    "[LIVE] SOLD Slot {} @ {} (profit {:.2})",
                    slot_id,
                    fmt_price(exec_price),
                    profit
                ));
            }
            Err(e) => {
                if let Some(logger) = &self.audit_logger {
                    logger.log_fail(&config.symbol, "Sell", slot_id, &e.to_string());
                }
                self.record_failure(format!("[LIVE] SELL FAILED Slot {}: {}", slot_id, e));
            }
        }
        Ok(())
    }
}

fn fmt_price(value: f64) -> String {
    if value.abs() >= 1.0 {
        format!("{:.2}", value)
    } else {
        format!("{:.6}", value)
    }
}

fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
