use crate::constants::PRICE_SIG_FIGS;

const SIZE_EPSILON: f64 = 1e-9;

/// Precision metadata of one tradable market.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketInfo {
    pub symbol: String,
    pub coin: String, // API identifier
    pub sz_decimals: u32,
    pub price_decimals: u32,
}

fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn floor_to_decimals(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    // 0.29 * 100 is 28.999999999999996; an exact lot must survive the floor
    ((value * factor) + SIZE_EPSILON).floor() / factor
}

fn round_to_significant_and_decimal(value: f64, sig_figs: u32, max_decimals: u32) -> f64 {
    if value.abs() < 1e-9 {
        return 0.0;
    }
    let abs_value = value.abs();
    let magnitude = abs_value.log10().floor() as i32;
    let scale = 10f64.powi(sig_figs as i32 - magnitude - 1);
    let rounded = (abs_value * scale).round() / scale;
    round_to_decimals(rounded.copysign(value), max_decimals)
}

impl MarketInfo {
    pub fn spot(symbol: String, coin: String, sz_decimals: u32) -> Self {
        Self {
            symbol,
            coin,
            sz_decimals,
            price_decimals: 8u32.saturating_sub(sz_decimals),
        }
    }

    pub fn perp(symbol: String, sz_decimals: u32) -> Self {
        Self {
            coin: symbol.clone(),
            symbol,
            sz_decimals,
            price_decimals: 6u32.saturating_sub(sz_decimals),
        }
    }

    pub fn round_price(&self, price: f64) -> f64 {
        round_to_significant_and_decimal(price, PRICE_SIG_FIGS, self.price_decimals)
    }

    pub fn round_size(&self, sz: f64) -> f64 {
        round_to_decimals(sz, self.sz_decimals)
    }

    /// Rounds a sell size down so it never exceeds the held quantity.
    pub fn floor_size(&self, sz: f64) -> f64 {
        floor_to_decimals(sz, self.sz_decimals)
    }
}
