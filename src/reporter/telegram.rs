use crate::broadcast::types::{StrategySummary, WSEvent};
use crate::config::broadcast::TelegramConfig;
use anyhow::{Context, Result};
use log::{error, info, warn};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tokio::sync::{broadcast, Mutex};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Pushes trade notifications to a Telegram chat and answers `/status`.
pub struct TelegramReporter {
    bot: Bot,
    chat_id: ChatId,
    receiver: broadcast::Receiver<WSEvent>,
}

impl TelegramReporter {
    pub fn new(
        config: Option<TelegramConfig>,
        receiver: broadcast::Receiver<WSEvent>,
    ) -> Result<Option<Self>> {
        let Some(config) = config else {
            return Ok(None);
        };
        let chat_id = config
            .chat_id
            .trim()
            .parse::<i64>()
            .context("TELEGRAM chat_id must be numeric")?;
        Ok(Some(Self {
            bot: Bot::new(config.bot_token),
            chat_id: ChatId(chat_id),
            receiver,
        }))
    }

    pub async fn run(self) {
        info!("Telegram Reporter started.");
        let bot = self.bot.clone();
        let chat_id = self.chat_id;

        let last_summary: Arc<Mutex<Option<StrategySummary>>> = Arc::new(Mutex::new(None));
        let last_summary_evt = last_summary.clone();

        // Command handler (/status)
        let bot_repl = bot.clone();
        tokio::spawn(async move {
            let handler = Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
                let summary_lock = last_summary.clone();
                async move {
                    if msg.text() == Some("/status") {
                        let reply = match &*summary_lock.lock().await {
                            Some(s) => format_status(s),
                            None => "⚠️ No Status Available yet.".to_string(),
                        };
                        bot.send_message(msg.chat.id, reply)
                            .parse_mode(ParseMode::Html)
                            .await?;
                    }
                    respond(())
                }
            });

            Dispatcher::builder(bot_repl, handler)
                .enable_ctrlc_handler()
                .build()
                .dispatch()
                .await;
        });

        // Notifications
        let mut stream = BroadcastStream::new(self.receiver);
        while let Some(msg) = stream.next().await {
            match msg {
                Ok(WSEvent::Summary(s)) => {
                    *last_summary_evt.lock().await = Some(s);
                }
                Ok(event) => {
                    if let Some(text) = notification_for(&event) {
                        if let Err(e) = bot
                            .send_message(chat_id, text)
                            .parse_mode(ParseMode::Html)
                            .await
                        {
                            error!("Failed to send Telegram notification: {}", e);
                        }
                    }
                }
                Err(e) => warn!("Telegram Broadcast Stream Lagged: {}", e),
            }
        }
    }
}

/// Trades, order failures and errors are worth a push; price ticks and routine entries are not.
fn notification_for(event: &WSEvent) -> Option<String> {
    match event {
        WSEvent::Error(e) => Some(format!("🚨 <b>Error</b>\n<code>{}</code>", html_escape(e))),
        WSEvent::Activity(a) => {
            let icon = if a.message.contains("FAILED") {
                "⚠️"
            } else if a.message.contains("BOUGHT") {
                "🟢"
            } else if a.message.contains("SOLD") {
                "🔴"
            } else {
                return None;
            };
            Some(format!("{} <code>{}</code>", icon, html_escape(&a.message)))
        }
        _ => None,
    }
}

fn format_status(s: &StrategySummary) -> String {
    let mode = if s.dry_run { "DRY RUN" } else { "LIVE" };
    let price = s
        .price
        .map(|p| format!("{:.4}", p))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "🟢 <b>BitSplit ({})</b>\nSymbol: <code>{}</code> | State: <code>{}</code>\n📉 Price: <code>{}</code>\n📦 Slots: <code>{}/{}</code> bought, size <code>{:.6}</code>\n💰 PnL: <code>{:.2}</code> (Unrl: <code>{:.2}</code>) over <code>{}</code> roundtrips\n⏱ Uptime: {}",
        mode,
        html_escape(&s.symbol),
        s.state,
        price,
        s.bought_slots,
        s.slot_count,
        s.position_size,
        s.realized_pnl,
        s.unrealized_pnl,
        s.roundtrips,
        s.uptime
    )
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::types::{ActivityEvent, MarketEvent};

    fn activity(message: &str) -> WSEvent {
        WSEvent::Activity(ActivityEvent {
            timestamp: "2026-01-01 00:00:00".to_string(),
            message: message.to_string(),
        })
    }

    #[test]
    fn test_only_trades_and_failures_notify() {
        assert!(notification_for(&activity("[DRY RUN] BOUGHT Slot 1 @ 100.00")).is_some());
        assert!(notification_for(&activity("[LIVE] SOLD Slot 1 @ 105.00 (profit 5.00)"))
            .unwrap()
            .starts_with("🔴"));
        assert!(notification_for(&activity("[LIVE] SELL FAILED Slot 2: <timeout>"))
            .unwrap()
            .contains("&lt;timeout&gt;"));
        assert!(notification_for(&activity("Strategy configured: HYPE/USDC")).is_none());
        assert!(notification_for(&WSEvent::MarketUpdate(MarketEvent { price: 1.0 })).is_none());
        assert!(notification_for(&WSEvent::Error("feed down".to_string())).is_some());
    }

    #[test]
    fn test_missing_config_disables_reporter() {
        let (tx, _) = broadcast::channel::<WSEvent>(4);
        assert!(TelegramReporter::new(None, tx.subscribe()).unwrap().is_none());
    }

    #[test]
    fn test_status_text() {
        let summary = StrategySummary {
            symbol: "HYPE/USDC".to_string(),
            state: "Active".to_string(),
            dry_run: true,
            price: None,
            uptime: "5m".to_string(),
            slot_count: 10,
            bought_slots: 3,
            position_size: 1.5,
            invested: 150.0,
            realized_pnl: 2.0,
            unrealized_pnl: -1.0,
            roundtrips: 4,
        };
        let text = format_status(&summary);
        assert!(text.contains("DRY RUN"));
        assert!(text.contains("<code>3/10</code>"));
        assert!(text.contains("Price: <code>-</code>"));
    }
}
