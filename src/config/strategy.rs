use crate::constants::MAX_SLOTS;
use crate::error::{StrategyError, StrategyResult};
use serde::{Deserialize, Serialize};

/// Immutable parameters of one BitSplit run.
///
/// Fractions are plain ratios: `gap_fraction = 0.01` means each slot buys 1% below
/// the previous one, `target_return = 0.01` sells 1% above the fill price.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GridConfiguration {
    pub symbol: String,
    pub slot_count: u32,
    pub investment_per_slot: f64,
    pub start_price: f64,
    pub gap_fraction: f64,
    pub target_return: f64,
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
}

fn default_dry_run() -> bool {
    true // Simulation unless explicitly switched to live
}

impl GridConfiguration {
    pub fn validate(&self) -> StrategyResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(StrategyError::InvalidConfig(
                "Symbol must not be empty.".to_string(),
            ));
        }
        if !(1..=MAX_SLOTS).contains(&self.slot_count) {
            return Err(StrategyError::InvalidConfig(format!(
                "Slot count {} must be between 1 and {}.",
                self.slot_count, MAX_SLOTS
            )));
        }
        if !self.investment_per_slot.is_finite() || self.investment_per_slot <= 0.0 {
            return Err(StrategyError::InvalidConfig(format!(
                "Investment per slot {} must be positive.",
                self.investment_per_slot
            )));
        }
        if !self.start_price.is_finite() || self.start_price <= 0.0 {
            return Err(StrategyError::InvalidConfig(format!(
                "Start price {} must be positive.",
                self.start_price
            )));
        }
        if !(self.gap_fraction > 0.0 && self.gap_fraction < 1.0) {
            return Err(StrategyError::InvalidConfig(format!(
                "Gap fraction {} must be in (0, 1).",
                self.gap_fraction
            )));
        }
        if !self.target_return.is_finite() || self.target_return <= 0.0 {
            return Err(StrategyError::InvalidConfig(format!(
                "Target return {} must be positive.",
                self.target_return
            )));
        }
        Ok(())
    }

    pub fn mode_name(&self) -> &str {
        if self.dry_run {
            "DRY RUN"
        } else {
            "LIVE"
        }
    }
}

pub fn print_strategy_help() {
    println!("BitSplit Strategy Configuration (TOML):\n");
    println!("   Description: Splits capital into N slots. Each slot buys when the price");
    println!("   drops to its target and sells once it rises by the target return, then");
    println!("   waits to buy again.");
    println!("   Parameters:");
    println!("     - symbol (String): Trading pair (e.g., 'HYPE/USDC' for spot, 'BTC' for perp).");
    println!("     - slot_count (u32): Number of slots (1-{}).", MAX_SLOTS);
    println!("     - investment_per_slot (f64): Quote amount spent by each slot buy.");
    println!("     - start_price (f64): Buy target of slot 1.");
    println!("     - gap_fraction (f64): Drop between consecutive slot targets (0.01 = 1%).");
    println!("     - target_return (f64): Rise above the fill price to sell (0.01 = 1%).");
    println!("     - dry_run (bool): Simulate fills locally (default: true).");
    println!();
    println!("   Slot i buys at start_price * (1 - gap_fraction)^(i - 1).");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> GridConfiguration {
        GridConfiguration {
            symbol: "HYPE/USDC".to_string(),
            slot_count: 10,
            investment_per_slot: 20.0,
            start_price: 25.0,
            gap_fraction: 0.01,
            target_return: 0.01,
            dry_run: true,
        }
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validation_slot_count_bounds() {
        let mut config = valid();
        config.slot_count = 0;
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "Invalid configuration: Slot count 0 must be between 1 and 50."
        );
        config.slot_count = 51;
        assert!(config.validate().is_err());
        config.slot_count = 50;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_non_positive_values() {
        let mut config = valid();
        config.investment_per_slot = 0.0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.start_price = -1.0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.target_return = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_gap_fraction_range() {
        for gap in [0.0, 1.0, 1.5, -0.01] {
            let mut config = valid();
            config.gap_fraction = gap;
            assert!(config.validate().is_err(), "gap {} should be rejected", gap);
        }
    }

    #[test]
    fn test_validation_empty_symbol() {
        let mut config = valid();
        config.symbol = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_toml_defaults_to_dry_run() {
        let toml_str = r#"
            symbol = "BTC"
            slot_count = 3
            investment_per_slot = 1000.0
            start_price = 100.0
            gap_fraction = 0.1
            target_return = 0.05
        "#;
        let config: GridConfiguration = toml::from_str(toml_str).unwrap();
        assert!(config.dry_run);
        assert_eq!(config.slot_count, 3);
        assert_eq!(config.mode_name(), "DRY RUN");
    }
}
