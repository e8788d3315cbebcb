//! Buy-target derivation for the slot grid.

use crate::constants::MAX_SLOTS;
use crate::error::{StrategyError, StrategyResult};

/// Calculates the buy target of every slot.
///
/// * `start_price` - Buy target of the first slot.
/// * `slot_count` - Number of slots (1..=50).
/// * `gap_fraction` - Drop applied slot to slot, in (0, 1).
///
/// Each target sits `gap_fraction` below the previous slot's target, so
/// `target[i] = start_price * (1 - gap_fraction)^i`.
pub fn plan_targets(start_price: f64, slot_count: u32, gap_fraction: f64) -> StrategyResult<Vec<f64>> {
    if !(1..=MAX_SLOTS).contains(&slot_count) {
        return Err(StrategyError::InvalidConfig(format!(
            "Slot count {} must be between 1 and {}.",
            slot_count, MAX_SLOTS
        )));
    }
    if !(gap_fraction > 0.0 && gap_fraction < 1.0) {
        return Err(StrategyError::InvalidConfig(format!(
            "Gap fraction {} must be in (0, 1).",
            gap_fraction
        )));
    }
    if !start_price.is_finite() || start_price <= 0.0 {
        return Err(StrategyError::InvalidConfig(format!(
            "Start price {} must be positive.",
            start_price
        )));
    }

    let mut targets = Vec::with_capacity(slot_count as usize);
    let mut target = start_price;
    for _ in 0..slot_count {
        targets.push(target);
        target *= 1.0 - gap_fraction;
    }
    Ok(targets)
}
