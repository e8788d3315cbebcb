//! Console rendering of the slot table, summary and activity log.

use crate::broadcast::types::{StrategySummary, WSEvent};
use crate::strategy::slot::{SlotStatus, SlotView};
use tokio::sync::broadcast;

/// Rows shown before the table is elided in the middle.
const MAX_TABLE_ROWS: usize = 40;

pub struct ConsoleRenderer;

impl ConsoleRenderer {
    /// Render a complete status report to stdout.
    pub fn render(summary: &StrategySummary, slots: &[SlotView], log: &[String], log_lines: usize) {
        println!();
        println!("{}", "=".repeat(72));
        println!(" BITSPLIT {} REPORT", if summary.dry_run { "DRY RUN" } else { "LIVE" });
        println!("{}", "=".repeat(72));

        println!();
        print!("{}", Self::slot_table(slots, summary.price));

        println!();
        println!("{}", "-".repeat(72));
        Self::render_summary(summary);

        println!();
        println!("{}", "-".repeat(72));
        println!("ACTIVITY (newest first)");
        if log.is_empty() {
            println!("  (no activity yet)");
        }
        for line in log.iter().take(log_lines) {
            println!("  {}", line);
        }

        println!();
        println!("{}", "=".repeat(72));
        println!();
    }

    fn render_summary(s: &StrategySummary) {
        println!("STRATEGY: {}", s.symbol);
        println!("State:    {}", s.state);
        if let Some(price) = s.price {
            println!("Price:    {:.6}", price);
        }
        println!("Uptime:   {}", s.uptime);
        println!("Slots:    {}/{} bought", s.bought_slots, s.slot_count);

        let (base, quote) = parse_symbol(&s.symbol);
        println!(
            "Position: {:.6} {} | Invested {:.3} {}",
            s.position_size, base, s.invested, quote
        );
        println!("Realized PnL:    {:.4} ({} roundtrips)", s.realized_pnl, s.roundtrips);
        println!("Unrealized PnL:  {:.4}", s.unrealized_pnl);
    }

    /// Slot table; the row nearest the current price is marked with `>`.
    pub fn slot_table(slots: &[SlotView], price: Option<f64>) -> String {
        let mut out = String::new();
        out.push_str(&format!("SLOTS ({})\n", slots.len()));
        out.push_str(&format!(
            "  {:<4} | {:<7} | {:<12} | {:<12} | {:<14} | {:<12} | {:>8}\n",
            "ID", "STATUS", "BUY TARGET", "BUY PRICE", "QTY", "SELL TARGET", "P/L %"
        ));
        out.push_str(&format!("{}\n", "-".repeat(88)));

        let nearest = price.and_then(|p| {
            slots
                .iter()
                .min_by(|a, b| {
                    (a.buy_target - p)
                        .abs()
                        .total_cmp(&(b.buy_target - p).abs())
                })
                .map(|s| s.id)
        });

        let rows: Vec<&SlotView> = if slots.len() > MAX_TABLE_ROWS {
            let half = MAX_TABLE_ROWS / 2;
            slots
                .iter()
                .take(half)
                .chain(slots.iter().skip(slots.len() - half))
                .collect()
        } else {
            slots.iter().collect()
        };

        for (i, slot) in rows.iter().enumerate() {
            if slots.len() > MAX_TABLE_ROWS && i == MAX_TABLE_ROWS / 2 {
                out.push_str(&format!(
                    "  ... (Hiding {} slots) ...\n",
                    slots.len() - MAX_TABLE_ROWS
                ));
            }
            let marker = if nearest == Some(slot.id) { '>' } else { ' ' };
            let row = match slot.status {
                SlotStatus::Ready => format!(
                    "{}{:<4} | {:<7} | {:<12.6} | {:<12} | {:<14} | {:<12} | {:>8}\n",
                    marker, slot.id, slot.status, slot.buy_target, "-", "-", "-", "-"
                ),
                SlotStatus::Bought => format!(
                    "{}{:<4} | {:<7} | {:<12.6} | {:<12.6} | {:<14.8} | {:<12.6} | {:>8.2}\n",
                    marker,
                    slot.id,
                    slot.status,
                    slot.buy_target,
                    slot.buy_price,
                    slot.quantity,
                    slot.sell_target,
                    slot.profit_rate
                ),
            };
            out.push(' ');
            out.push_str(&row);
        }
        out
    }
}

/// Re-renders the report on every slot update until the channel closes.
pub async fn run_dashboard(mut receiver: broadcast::Receiver<WSEvent>, log_lines: usize) {
    let mut summary: Option<StrategySummary> = None;
    let mut log: Vec<String> = Vec::new();

    loop {
        match receiver.recv().await {
            Ok(WSEvent::Summary(s)) => summary = Some(s),
            Ok(WSEvent::Activity(a)) => {
                log.insert(0, format!("[{}] {}", a.timestamp, a.message));
                log.truncate(log_lines);
            }
            Ok(WSEvent::Slots(slots)) => {
                if let Some(s) = &summary {
                    ConsoleRenderer::render(s, &slots, &log, log_lines);
                }
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Parse symbol into (base, quote).
fn parse_symbol(symbol: &str) -> (String, String) {
    match symbol.split_once('/') {
        Some((base, quote)) => (base.to_string(), quote.to_string()),
        None => (symbol.to_string(), "USDC".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(id: u32, target: f64) -> SlotView {
        SlotView {
            id,
            status: SlotStatus::Ready,
            buy_target: target,
            buy_price: 0.0,
            quantity: 0.0,
            sell_target: 0.0,
            profit_rate: 0.0,
        }
    }

    #[test]
    fn test_table_marks_nearest_slot() {
        let mut bought = ready(2, 90.0);
        bought.status = SlotStatus::Bought;
        bought.buy_price = 90.0;
        bought.quantity = 1.0;
        bought.sell_target = 94.5;

        let table = ConsoleRenderer::slot_table(&[ready(1, 100.0), bought, ready(3, 81.0)], Some(89.0));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "SLOTS (3)");
        assert!(lines[4].starts_with(" >2"));
        assert!(lines[4].contains("BOUGHT"));
        assert!(lines[3].contains("READY"));
    }

    #[test]
    fn test_large_table_is_elided() {
        let slots: Vec<SlotView> = (1..=50).map(|i| ready(i, 100.0 - i as f64)).collect();
        let table = ConsoleRenderer::slot_table(&slots, None);
        assert!(table.contains("Hiding 10 slots"));
    }

    #[test]
    fn test_parse_symbol() {
        assert_eq!(parse_symbol("HYPE/USDC"), ("HYPE".to_string(), "USDC".to_string()));
        assert_eq!(parse_symbol("BTC"), ("BTC".to_string(), "USDC".to_string()));
    }
}
