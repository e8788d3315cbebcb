use anyhow::{anyhow, Result};
use bitsplit_bot::broadcast::types::{SystemInfo, WSEvent};
use bitsplit_bot::broadcast::StatusBroadcaster;
use bitsplit_bot::config::broadcast::load_broadcast_config;
use bitsplit_bot::config::{exchange::load_exchange_config, load_config};
use bitsplit_bot::engine::runner::Runner;
use bitsplit_bot::engine::StrategyEngine;
use bitsplit_bot::exchange::hyperliquid::HyperliquidSession;
use bitsplit_bot::logging::order_audit::OrderAuditLogger;
use bitsplit_bot::reporter::telegram::TelegramReporter;
use bitsplit_bot::ui::console::{run_dashboard, ConsoleRenderer};
use clap::Parser;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "BitSplit split-buy grid bot for Hyperliquid", long_about = None)]
struct Args {
    #[arg(short, long)]
    config: Option<String>,

    #[arg(short, long)]
    list_strategies: bool,

    #[arg(long)]
    create: bool,

    #[arg(long)]
    ws_port: Option<u16>,

    /// Force simulated execution regardless of the config file
    #[arg(long, conflicts_with = "live")]
    dry_run: bool,

    /// Force live execution regardless of the config file
    #[arg(long)]
    live: bool,

    /// Print the slot table to the console on every status update
    #[arg(long)]
    dashboard: bool,
}

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

#[tokio::main]
async fn main() -> Result<()> {
    // ---------------------------------------------------------
    // 1. Setup Logging (Tracing)
    // ---------------------------------------------------------
    let file_appender = tracing_appender::rolling::daily("logs", "application.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
                .add_directive("bitsplit_bot=debug".parse()?),
        );

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_target(false)
        .with_filter(tracing_subscriber::EnvFilter::new("info,bitsplit_bot=debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    let args = Args::parse();

    if args.list_strategies {
        bitsplit_bot::config::strategy::print_strategy_help();
        return Ok(());
    }

    if args.create {
        if let Err(e) = bitsplit_bot::config::creator::create_config() {
            error!("Error creating config: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    let config_path = args
        .config
        .ok_or_else(|| anyhow!("Config file is required unless --list-strategies or --create is used"))?;

    // ---------------------------------------------------------
    // 2. Load Configuration
    // ---------------------------------------------------------
    info!("Loading config from: {}", config_path);
    let mut config = load_config(&config_path)?;
    if args.dry_run {
        config.dry_run = true;
    } else if args.live {
        config.dry_run = false;
    }

    let exchange_config = match load_exchange_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load exchange config: {}", e);
            std::process::exit(1);
        }
    };
    info!("Exchange config loaded for network: {}", exchange_config.network);

    if !config.dry_run && !exchange_config.has_credentials() {
        error!("Live mode requires BITSPLIT_PRIVATE_KEY (or BITSPLIT_PRIVATE_KEY_FILE)");
        std::process::exit(1);
    }

    let broadcast_config = match load_broadcast_config(args.ws_port) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load broadcast config: {}", e);
            std::process::exit(1);
        }
    };

    // ---------------------------------------------------------
    // 3. Setup Audit Logger (live orders only)
    // ---------------------------------------------------------
    let audit_logger = if config.dry_run {
        None
    } else {
        match OrderAuditLogger::new("logs") {
            Ok(l) => Some(l),
            Err(e) => {
                error!("Failed to initialize Order Audit Logger: {}", e);
                None
            }
        }
    };

    // ---------------------------------------------------------
    // 4. Broadcast & Reporting
    // ---------------------------------------------------------
    let ws_config = broadcast_config.websocket.clone();
    info!(
        "WebSocket Status Server enabled on {}:{}",
        ws_config.host, ws_config.port
    );
    let broadcaster = StatusBroadcaster::new(Some(ws_config));

    let reporter_handle = match TelegramReporter::new(broadcast_config.telegram, broadcaster.subscribe()) {
        Ok(Some(reporter)) => {
            info!("Telegram Reporter initialized. Spawning background task...");
            Some(tokio::spawn(reporter.run()))
        }
        Ok(None) => None,
        Err(e) => {
            error!("Failed to initialize Telegram Reporter: {}", e);
            None
        }
    };

    if args.dashboard {
        tokio::spawn(run_dashboard(broadcaster.subscribe(), 10));
    }

    // ---------------------------------------------------------
    // 5. Exchange Session
    // ---------------------------------------------------------
    let session = match HyperliquidSession::connect(&exchange_config).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Exchange connection failed: {:#}", e);
            broadcaster.send(WSEvent::Error(e.to_string()));
            wait_for_reporter(reporter_handle).await;
            std::process::exit(1);
        }
    };

    if let Err(e) = session.market_info(&config.symbol) {
        error!("{}. Please check your configuration.", e);
        std::process::exit(1);
    }

    broadcaster.send(WSEvent::Info(SystemInfo {
        network: session.network().to_string(),
        exchange: "hyperliquid".to_string(),
        can_trade: session.is_connected(),
    }));

    // ---------------------------------------------------------
    // 6. Engine & Runner
    // ---------------------------------------------------------
    let engine =
        StrategyEngine::new(session.clone(), session.clone()).with_audit_logger(audit_logger);
    let (runner, handle) = Runner::new(engine, broadcaster.clone());
    let runner_task = tokio::spawn(runner.run());

    info!(
        "Starting BitSplit ({}) for {}",
        config.mode_name(),
        config.symbol
    );
    if let Err(e) = handle.configure(config).await {
        error!("Strategy configuration failed: {}", e);
        broadcaster.send(WSEvent::Error(e.to_string()));
        let _ = handle.shutdown().await;
        wait_for_reporter(reporter_handle).await;
        std::process::exit(1);
    }

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, stopping...");
    let _ = handle.stop().await;
    handle.shutdown().await?;

    let engine = runner_task.await??;
    ConsoleRenderer::render(
        &engine.summary(),
        &engine.snapshot(),
        &engine.log_entries(),
        20,
    );

    Ok(())
}

async fn wait_for_reporter(handle: Option<tokio::task::JoinHandle<()>>) {
    match handle {
        Some(handle) => {
            info!("Waiting for Telegram Reporter to shut down...");
            let _ = tokio::time::timeout(Duration::from_secs(10), handle).await;
        }
        None => tokio::time::sleep(Duration::from_secs(2)).await,
    }
}
