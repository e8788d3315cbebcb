//! Hyperliquid-backed exchange session.
//!
//! One `HyperliquidSession` owns the info and exchange clients for the process.
//! It is shared into the engine as both price feed and order executor.

use super::market::MarketInfo;
use super::{validate_price, BuyFill, OrderExecutor, PriceFeed, SellFill};
use crate::config::exchange::ExchangeConfig;
use crate::constants::MARKET_ORDER_SLIPPAGE;
use crate::error::{ExchangeError, ExchangeResult};
use crate::model::{Cloid, OrderSide};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::H160;
use hyperliquid_rust_sdk::{
    BaseUrl, ClientLimit, ClientOrder, ClientOrderRequest, ExchangeClient, ExchangeDataStatus,
    ExchangeResponseStatus, InfoClient,
};
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Balance {
    pub total: f64,
    pub available: f64,
}

struct TradingClient {
    exchange_client: ExchangeClient,
    user_address: H160,
}

pub struct HyperliquidSession {
    network: String,
    info_client: Mutex<InfoClient>,
    trading: Option<TradingClient>,
    markets: HashMap<String, MarketInfo>,
}

impl HyperliquidSession {
    /// Connects to the configured network.
    ///
    /// With credentials the session can trade and the connection is verified by a
    /// balance fetch. Without them it only serves prices.
    pub async fn connect(config: &ExchangeConfig) -> Result<Self> {
        let base_url = if config.is_mainnet() {
            BaseUrl::Mainnet
        } else {
            BaseUrl::Testnet
        };

        info!("Connecting to InfoClient ({})...", config.network);
        let info_client = InfoClient::new(None, Some(base_url))
            .await
            .map_err(|e| anyhow!("Failed to connect InfoClient: {}", e))?;

        let markets = load_metadata(&info_client).await?;
        info!("Loaded metadata for {} markets.", markets.len());

        let trading = match config.private_key.as_deref().filter(|k| !k.is_empty()) {
            Some(private_key) => {
                let wallet: LocalWallet = private_key
                    .parse()
                    .map_err(|e| anyhow!("Invalid private key: {}", e))?;

                let user_address = match &config.account_address {
                    Some(addr) => H160::from_str(addr)
                        .map_err(|e| anyhow!("Invalid account address: {}", e))?,
                    None => wallet.address(),
                };

                info!("Connecting to ExchangeClient...");
                let exchange_client =
                    ExchangeClient::new(None, wallet, Some(base_url), None, None)
                        .await
                        .map_err(|e| anyhow!("Failed to connect ExchangeClient: {}", e))?;

                Some(TradingClient {
                    exchange_client,
                    user_address,
                })
            }
            None => {
                warn!("No private key configured. Session is price-only (dry run).");
                None
            }
        };

        let session = Self {
            network: config.network.clone(),
            info_client: Mutex::new(info_client),
            trading,
            markets,
        };

        // Lightweight round trip proves the credentials and account are usable
        if session.is_connected() {
            let balances = session
                .fetch_balances()
                .await
                .context("Connection check (balance fetch) failed")?;
            log_balances(&balances);
        }

        info!("Connected to hyperliquid {} successfully.", session.network);
        Ok(session)
    }

    /// True when the session can place orders.
    pub fn is_connected(&self) -> bool {
        self.trading.is_some()
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn market_info(&self, symbol: &str) -> ExchangeResult<&MarketInfo> {
        self.markets
            .get(symbol)
            .ok_or_else(|| ExchangeError::UnknownSymbol(symbol.to_string()))
    }

    /// Spot balances keyed by asset.
    pub async fn fetch_balances(&self) -> ExchangeResult<HashMap<String, Balance>> {
        let trading = self.trading.as_ref().ok_or(ExchangeError::NotConnected)?;
        let info = self.info_client.lock().await;
        let response = info.user_token_balances(trading.user_address).await?;

        Ok(response
            .balances
            .into_iter()
            .map(|b| {
                let total: f64 = b.total.parse().unwrap_or(0.0);
                let hold: f64 = b.hold.parse().unwrap_or(0.0);
                (
                    b.coin,
                    Balance {
                        total,
                        available: total - hold,
                    },
                )
            })
            .collect())
    }

    async fn mid_price(&self, market: &MarketInfo) -> ExchangeResult<f64> {
        let info = self.info_client.lock().await;
        let mids = info.all_mids().await?;
        let raw = mids
            .get(&market.coin)
            .ok_or_else(|| ExchangeError::NoPrice(format!("no mid for {}", market.coin)))?;
        let price: f64 = raw
            .parse()
            .map_err(|_| ExchangeError::NoPrice(format!("unparsable mid '{}'", raw)))?;
        validate_price(&market.symbol, price)
    }

    /// Sends an IOC limit order priced through the book, which fills like a market order.
    async fn market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        size: f64,
    ) -> ExchangeResult<(f64, f64)> {
        let trading = self.trading.as_ref().ok_or(ExchangeError::NotConnected)?;
        let market = self.market_info(symbol)?;

        if size <= 0.0 {
            return Err(ExchangeError::Rejected(format!(
                "size {} rounds to zero at {} decimals",
                size, market.sz_decimals
            )));
        }

        let mid = self.mid_price(market).await?;
        let limit_px = market.round_price(if side.is_buy() {
            mid * (1.0 + MARKET_ORDER_SLIPPAGE)
        } else {
            mid * (1.0 - MARKET_ORDER_SLIPPAGE)
        });
        let cloid = Cloid::new();

        info!(
            "[ORDER_REQUEST] MARKET {} {} {} (IOC @ {}, cloid {})",
            side, size, symbol, limit_px, cloid
        );

        let request = ClientOrderRequest {
            asset: market.coin.clone(),
            is_buy: side.is_buy(),
            reduce_only: false,
            limit_px,
            sz: size,
            cloid: Some(cloid.as_uuid()),
            order_type: ClientOrder::Limit(ClientLimit {
                tif: "Ioc".to_string(),
            }),
        };

        let response = trading
            .exchange_client
            .order(request, None)
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        let result = match response {
            ExchangeResponseStatus::Ok(resp) => {
                let status = resp
                    .data
                    .and_then(|d| d.statuses.into_iter().next())
                    .ok_or_else(|| ExchangeError::Rejected("No status in response".into()))?;
                match status {
                    ExchangeDataStatus::Filled(f) => {
                        let amount: f64 = f.total_sz.parse().unwrap_or(size);
                        let px: f64 = f.avg_px.parse().unwrap_or(mid);
                        info!("[ORDER_FILLED] {} {} {} @ {}", side, amount, symbol, px);
                        Ok((px, amount))
                    }
                    ExchangeDataStatus::Error(e) => Err(ExchangeError::Rejected(e)),
                    other => Err(ExchangeError::Rejected(format!(
                        "IOC order not filled: {:?}",
                        other
                    ))),
                }
            }
            ExchangeResponseStatus::Err(e) => Err(ExchangeError::Rejected(e)),
        };

        if let Err(e) = &result {
            warn!("[ORDER_FAILED] {} {} {} (cloid {}): {}", side, size, symbol, cloid, e);
        }
        result
    }
}

#[async_trait]
impl PriceFeed for HyperliquidSession {
    async fn current_price(&self, symbol: &str) -> ExchangeResult<f64> {
        let market = self.market_info(symbol)?;
        self.mid_price(market).await
    }
}

// No cost-denominated market buy on Hyperliquid; the engine falls back to quantity.
#[async_trait]
impl OrderExecutor for HyperliquidSession {
    async fn market_buy_by_quantity(&self, symbol: &str, quantity: f64) -> ExchangeResult<BuyFill> {
        let size = self.market_info(symbol)?.round_size(quantity);
        let (price, amount) = self.market_order(symbol, OrderSide::Buy, size).await?;
        Ok(BuyFill {
            executed_price: Some(price).filter(|p| *p > 0.0),
            executed_quantity: Some(amount).filter(|q| *q > 0.0),
        })
    }

    async fn market_sell_by_quantity(
        &self,
        symbol: &str,
        quantity: f64,
    ) -> ExchangeResult<SellFill> {
        let size = self.market_info(symbol)?.floor_size(quantity);
        let (price, amount) = self.market_order(symbol, OrderSide::Sell, size).await?;
        Ok(SellFill {
            executed_price: Some(price).filter(|p| *p > 0.0),
            executed_quantity: Some(amount).filter(|q| *q > 0.0),
        })
    }
}

/// Load market metadata (spot and perp) from the exchange.
async fn load_metadata(info_client: &InfoClient) -> Result<HashMap<String, MarketInfo>> {
    info!("Fetching market metadata...");
    let mut markets = HashMap::new();

    // --- Fetch Spot Metadata ---
    match info_client.spot_meta().await {
        Ok(spot_meta) => {
            let index_to_token: HashMap<_, _> =
                spot_meta.tokens.iter().map(|t| (t.index, t)).collect();
            for asset in spot_meta.universe {
                if asset.tokens.len() >= 2 {
                    if let (Some(base), Some(quote)) = (
                        index_to_token.get(&asset.tokens[0]),
                        index_to_token.get(&asset.tokens[1]),
                    ) {
                        let symbol = format!("{}/{}", base.name, quote.name);
                        let info =
                            MarketInfo::spot(symbol.clone(), asset.name.clone(), base.sz_decimals as u32);
                        markets.insert(symbol, info);
                    }
                }
            }
        }
        Err(e) => error!("Failed to fetch spot metadata: {}", e),
    }

    // --- Fetch Perp Metadata ---
    match info_client.meta().await {
        Ok(meta) => {
            for asset in meta.universe {
                let info = MarketInfo::perp(asset.name.clone(), asset.sz_decimals);
                markets.insert(asset.name, info);
            }
        }
        Err(e) => error!("Failed to fetch perp metadata: {}", e),
    }

    if markets.is_empty() {
        return Err(anyhow!("No market metadata available"));
    }
    Ok(markets)
}

fn log_balances(balances: &HashMap<String, Balance>) {
    info!("========================================");
    info!("           BALANCE SNAPSHOT             ");
    info!("========================================");

    let mut assets: Vec<_> = balances.keys().collect();
    assets.sort();

    if assets.is_empty() {
        info!("(No Spot Balances)");
    }
    for asset in assets {
        if let Some(balance) = balances.get(asset) {
            if balance.total > 0.0 {
                info!(
                    "{:<10} | Total: {:<12.4} | Avail: {:<12.4}",
                    asset, balance.total, balance.available
                );
            }
        }
    }
    info!("========================================");
}
