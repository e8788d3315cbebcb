use super::planner::plan_targets;
use super::slot::{Slot, SlotStatus, SlotView};
use crate::config::strategy::GridConfiguration;
use crate::error::{StrategyError, StrategyResult};

/// Holds every slot of the active grid and applies buy/sell transitions.
///
/// The ledger never performs I/O. Each transition leaves a slot either fully
/// READY (price fields zeroed) or fully BOUGHT (price fields positive).
#[derive(Debug, Clone, Default)]
pub struct SlotLedger {
    slots: Vec<Slot>,

    // Performance Metrics
    realized_profit: f64,
    roundtrips: u32,
}

impl SlotLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the slot set from `config`, discarding any previous slots and metrics.
    pub fn initialize(&mut self, config: &GridConfiguration) -> StrategyResult<()> {
        let targets = plan_targets(config.start_price, config.slot_count, config.gap_fraction)?;
        self.slots = targets
            .into_iter()
            .enumerate()
            .map(|(i, target)| Slot::new(i as u32 + 1, target))
            .collect();
        self.realized_profit = 0.0;
        self.roundtrips = 0;
        Ok(())
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, slot_id: u32) -> Option<&Slot> {
        self.index_of(slot_id).map(|i| &self.slots[i])
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn realized_profit(&self) -> f64 {
        self.realized_profit
    }

    pub fn roundtrips(&self) -> u32 {
        self.roundtrips
    }

    /// Marks a READY slot as BOUGHT at the executed price and quantity.
    pub fn apply_buy(
        &mut self,
        slot_id: u32,
        executed_price: f64,
        executed_quantity: f64,
        target_return: f64,
    ) -> StrategyResult<()> {
        let slot = self.slot_mut(slot_id)?;
        if slot.status != SlotStatus::Ready {
            return Err(StrategyError::InvalidTransition {
                slot_id,
                status: slot.status,
                action: "buy",
            });
        }
        if !(executed_price > 0.0 && executed_quantity > 0.0) {
            return Err(StrategyError::OrderFailure(format!(
                "Slot {} buy reported non-positive execution (price {}, quantity {})",
                slot_id, executed_price, executed_quantity
            )));
        }

        slot.status = SlotStatus::Bought;
        slot.buy_price = executed_price;
        slot.quantity = executed_quantity;
        slot.sell_target = executed_price * (1.0 + target_return);
        slot.profit_rate = 0.0;
        Ok(())
    }

    /// Closes a BOUGHT slot at `current_price` and resets it to READY.
    ///
    /// Returns the realized profit `(current_price - buy_price) * quantity`.
    pub fn apply_sell(&mut self, slot_id: u32, current_price: f64) -> StrategyResult<f64> {
        self.apply_sell_filled(slot_id, current_price, None)
    }

    /// Like `apply_sell`, but books profit on `sold_quantity` when the venue sold
    /// a different size than the slot held.
    pub fn apply_sell_filled(
        &mut self,
        slot_id: u32,
        current_price: f64,
        sold_quantity: Option<f64>,
    ) -> StrategyResult<f64> {
        let slot = self.slot_mut(slot_id)?;
        if slot.status != SlotStatus::Bought {
            return Err(StrategyError::InvalidTransition {
                slot_id,
                status: slot.status,
                action: "sell",
            });
        }

        let quantity = sold_quantity.unwrap_or(slot.quantity);
        let profit = (current_price - slot.buy_price) * quantity;
        slot.reset();

        self.realized_profit += profit;
        self.roundtrips += 1;
        Ok(profit)
    }

    /// Refreshes the live profit percentage of a BOUGHT slot. READY slots are left untouched.
    pub fn update_unrealized(&mut self, slot_id: u32, current_price: f64) -> StrategyResult<()> {
        let slot = self.slot_mut(slot_id)?;
        if slot.status == SlotStatus::Bought && slot.buy_price > 0.0 {
            slot.profit_rate = (current_price - slot.buy_price) / slot.buy_price * 100.0;
        }
        Ok(())
    }

    /// Unrealized PnL of all open positions at `current_price`.
    pub fn unrealized_profit(&self, current_price: f64) -> f64 {
        self.slots
            .iter()
            .filter(|s| s.is_bought())
            .map(|s| (current_price - s.buy_price) * s.quantity)
            .sum()
    }

    pub fn snapshot(&self) -> Vec<SlotView> {
        self.slots.iter().map(Slot::view).collect()
    }

    fn index_of(&self, slot_id: u32) -> Option<usize> {
        // Ids are assigned 1..=N in order
        let idx = (slot_id as usize).checked_sub(1)?;
        match self.slots.get(idx) {
            Some(slot) if slot.id() == slot_id => Some(idx),
            _ => self.slots.iter().position(|s| s.id() == slot_id),
        }
    }

    fn slot_mut(&mut self, slot_id: u32) -> StrategyResult<&mut Slot> {
        let idx = self
            .index_of(slot_id)
            .ok_or(StrategyError::UnknownSlot(slot_id))?;
        Ok(&mut self.slots[idx])
    }
}
