use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use serde::Serialize;
use std::fs::{create_dir_all, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Debug, Serialize, Clone)]
pub struct OrderRecord {
    pub timestamp: String,
    pub symbol: String,
    pub order_type: String, // REQ, FILL, FAIL
    pub side: String,
    pub slot_id: u32,
    pub price: f64,
    pub size: f64,
    pub notes: Option<String>,
}

/// Append-only CSV trail of live orders (`trades.csv`).
#[derive(Clone)]
pub struct OrderAuditLogger {
    writer: Arc<Mutex<Writer<std::fs::File>>>,
}

impl OrderAuditLogger {
    pub fn new(log_dir: &str) -> Result<Self> {
        let dir = Path::new(log_dir);
        create_dir_all(dir).context("Failed to create log directory")?;

        let file_path = dir.join("trades.csv");
        let file_exists = file_path.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .context("Failed to open trades.csv")?;

        let writer = csv::WriterBuilder::new()
            .has_headers(!file_exists)
            .from_writer(file);

        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
        })
    }

    pub fn log(&self, record: OrderRecord) {
        if let Ok(mut w) = self.writer.lock() {
            if let Err(e) = w.serialize(record) {
                eprintln!("Failed to write order audit log: {}", e);
            } else {
                let _ = w.flush();
            }
        }
    }

    /// `size` is the quote cost for cost-based buys and the base quantity otherwise.
    pub fn log_req(&self, symbol: &str, side: &str, slot_id: u32, price: f64, size: f64, notes: Option<String>) {
        self.log(self.record(symbol, "REQ", side, slot_id, price, size, notes));
    }

    pub fn log_fill(&self, symbol: &str, side: &str, slot_id: u32, price: f64, size: f64) {
        self.log(self.record(symbol, "FILL", side, slot_id, price, size, None));
    }

    pub fn log_fail(&self, symbol: &str, side: &str, slot_id: u32, reason: &str) {
        self.log(self.record(symbol, "FAIL", side, slot_id, 0.0, 0.0, Some(reason.to_string())));
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &self,
        symbol: &str,
        order_type: &str,
        side: &str,
        slot_id: u32,
        price: f64,
        size: f64,
        notes: Option<String>,
    ) -> OrderRecord {
        OrderRecord {
            timestamp: Local::now().to_rfc3339(),
            symbol: symbol.to_string(),
            order_type: order_type.to_string(),
            side: side.to_string(),
            slot_id,
            price,
            size,
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_audit_log_header() {
        let dir = tempdir().unwrap();
        let log_dir = dir.path().to_str().unwrap();
        let logger = OrderAuditLogger::new(log_dir).unwrap();

        logger.log_req("BTC", "Buy", 3, 50000.0, 1.0, None);

        let file_path = dir.path().join("trades.csv");
        let content = std::fs::read_to_string(file_path).unwrap();
        let lines: Vec<&str> = content.trim().split('\n').collect();

        // Should have exactly 2 lines: header + 1 record
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("timestamp,symbol,order_type,side,slot_id,price,size,notes"));
        assert!(lines[1].contains("BTC,REQ,Buy,3,50000.0,1.0"));
    }

    #[test]
    fn test_reopen_does_not_repeat_header() {
        let dir = tempdir().unwrap();
        let log_dir = dir.path().to_str().unwrap();

        OrderAuditLogger::new(log_dir)
            .unwrap()
            .log_fill("BTC", "Sell", 1, 51000.0, 0.5);
        OrderAuditLogger::new(log_dir)
            .unwrap()
            .log_fail("BTC", "Sell", 1, "rejected");

        let content = std::fs::read_to_string(dir.path().join("trades.csv")).unwrap();
        let lines: Vec<&str> = content.trim().split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("FAIL"));
        assert!(lines[2].contains("rejected"));
    }
}
