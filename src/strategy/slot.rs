use serde::{Deserialize, Serialize};
use std::fmt;

/// Persisted status of a grid slot.
///
/// A sold slot goes straight back to `Ready`, so the grid cycles forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SlotStatus {
    Ready,
    Bought,
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad() so table columns can align on the status
        f.pad(match self {
            SlotStatus::Ready => "READY",
            SlotStatus::Bought => "BOUGHT",
        })
    }
}

/// One grid position with its own buy/sell trigger pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    id: u32,
    buy_target: f64,
    pub(crate) status: SlotStatus,
    pub(crate) buy_price: f64,
    pub(crate) quantity: f64,
    pub(crate) sell_target: f64,
    pub(crate) profit_rate: f64,
}

impl Slot {
    pub fn new(id: u32, buy_target: f64) -> Self {
        Self {
            id,
            buy_target,
            status: SlotStatus::Ready,
            buy_price: 0.0,
            quantity: 0.0,
            sell_target: 0.0,
            profit_rate: 0.0,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn status(&self) -> SlotStatus {
        self.status
    }

    pub fn buy_target(&self) -> f64 {
        self.buy_target
    }

    pub fn buy_price(&self) -> f64 {
        self.buy_price
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn sell_target(&self) -> f64 {
        self.sell_target
    }

    pub fn profit_rate(&self) -> f64 {
        self.profit_rate
    }

    pub fn is_ready(&self) -> bool {
        self.status == SlotStatus::Ready
    }

    pub fn is_bought(&self) -> bool {
        self.status == SlotStatus::Bought
    }

    /// A ready slot buys once the price is at or below its buy target.
    pub fn should_buy(&self, price: f64) -> bool {
        self.is_ready() && price <= self.buy_target
    }

    /// A bought slot sells once the price is at or above its sell target.
    pub fn should_sell(&self, price: f64) -> bool {
        self.is_bought() && price >= self.sell_target
    }

    pub(crate) fn reset(&mut self) {
        self.status = SlotStatus::Ready;
        self.buy_price = 0.0;
        self.quantity = 0.0;
        self.sell_target = 0.0;
        self.profit_rate = 0.0;
    }

    pub fn view(&self) -> SlotView {
        SlotView {
            id: self.id,
            status: self.status,
            buy_target: self.buy_target,
            buy_price: self.buy_price,
            quantity: self.quantity,
            sell_target: self.sell_target,
            profit_rate: self.profit_rate,
        }
    }
}

/// Read-only copy of a slot handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotView {
    pub id: u32,
    pub status: SlotStatus,
    pub buy_target: f64,
    pub buy_price: f64,
    pub quantity: f64,
    pub sell_target: f64,
    pub profit_rate: f64,
}
