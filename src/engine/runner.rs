//! Polling loop around the strategy engine.
//!
//! The runner owns the engine, so steps never overlap and configuration changes
//! land between steps. Other tasks talk to it through a [`RunnerHandle`].

use super::{EngineState, StepOutcome, StrategyEngine};
use crate::broadcast::{ActivityEvent, MarketEvent, StatusBroadcaster, WSEvent};
use crate::config::strategy::GridConfiguration;
use crate::constants::{STATUS_SUMMARY_INTERVAL, STEP_INTERVAL};
use crate::error::StrategyResult;
use anyhow::{anyhow, Result};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

pub enum EngineCommand {
    Configure(GridConfiguration, oneshot::Sender<StrategyResult<()>>),
    Stop(oneshot::Sender<StrategyResult<()>>),
    Shutdown,
}

#[derive(Clone)]
pub struct RunnerHandle {
    sender: mpsc::Sender<EngineCommand>,
}

impl RunnerHandle {
    /// Applies a configuration between steps. Reconfiguring discards all slots.
    pub async fn configure(&self, config: GridConfiguration) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Configure(config, reply)).await?;
        rx.await
            .map_err(|_| anyhow!("Runner dropped the configure request"))?
            .map_err(|e| anyhow!(e))
    }

    pub async fn stop(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Stop(reply)).await?;
        rx.await
            .map_err(|_| anyhow!("Runner dropped the stop request"))?
            .map_err(|e| anyhow!(e))
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(EngineCommand::Shutdown).await
    }

    async fn send(&self, command: EngineCommand) -> Result<()> {
        self.sender
            .send(command)
            .await
            .map_err(|_| anyhow!("Runner is not running"))
    }
}

pub struct Runner {
    engine: StrategyEngine,
    broadcaster: StatusBroadcaster,
    commands: mpsc::Receiver<EngineCommand>,
    step_interval: Duration,
    status_interval: Duration,
    // Activity entries already published
    published: u64,
    price_down: bool,
}

impl Runner {
    pub fn new(engine: StrategyEngine, broadcaster: StatusBroadcaster) -> (Self, RunnerHandle) {
        let (sender, commands) = mpsc::channel(16);
        let published = engine.activity().total_appended();
        let runner = Self {
            engine,
            broadcaster,
            commands,
            step_interval: STEP_INTERVAL,
            status_interval: STATUS_SUMMARY_INTERVAL,
            published,
            price_down: false,
        };
        (runner, RunnerHandle { sender })
    }

    pub fn with_intervals(mut self, step: Duration, status: Duration) -> Self {
        self.step_interval = step;
        self.status_interval = status;
        self
    }

    pub fn engine(&self) -> &StrategyEngine {
        &self.engine
    }

    /// Runs until `Shutdown` or until every handle is dropped. Returns the engine.
    pub async fn run(mut self) -> Result<StrategyEngine> {
        info!("[BITSPLIT] Runner started (state: {})", self.engine.state());
        self.publish_config();

        let mut step_timer = tokio::time::interval(self.step_interval);
        let mut status_timer = tokio::time::interval(self.status_interval);
        step_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(EngineCommand::Configure(config, reply)) => {
                            let result = self.engine.configure(config);
                            if result.is_ok() {
                                self.publish_config();
                                self.publish_status();
                            }
                            self.publish_activity();
                            let _ = reply.send(result);
                        }
                        Some(EngineCommand::Stop(reply)) => {
                            let result = self.engine.stop();
                            self.publish_activity();
                            self.publish_status();
                            let _ = reply.send(result);
                        }
                        Some(EngineCommand::Shutdown) | None => {
                            info!("[BITSPLIT] Runner shutting down");
                            break;
                        }
                    }
                }
                _ = step_timer.tick() => {
                    self.tick().await;
                }
                _ = status_timer.tick() => {
                    self.publish_status();
                }
            }
        }

        self.publish_status();
        Ok(self.engine)
    }

    async fn tick(&mut self) {
        match self.engine.state() {
            EngineState::Active => match self.engine.step().await {
                Ok(StepOutcome::Price(price)) => {
                    self.price_down = false;
                    self.broadcaster
                        .send(WSEvent::MarketUpdate(MarketEvent { price }));
                }
                Ok(StepOutcome::NoPrice(reason)) => {
                    // Report the start of an outage only
                    if !self.price_down {
                        self.broadcaster.send(WSEvent::Error(reason));
                    }
                    self.price_down = true;
                }
                Err(e) => {
                    warn!("[BITSPLIT] Step failed: {}", e);
                    self.broadcaster.send(WSEvent::Error(e.to_string()));
                }
            },
            // Keep the dashboard price fresh without evaluating slots
            EngineState::Inactive => {
                if let Some(price) = self.engine.quote().await {
                    self.broadcaster
                        .send(WSEvent::MarketUpdate(MarketEvent { price }));
                }
            }
            EngineState::Unconfigured => debug!("[BITSPLIT] Waiting for configuration"),
        }
        self.publish_activity();
    }

    fn publish_activity(&mut self) {
        let activity = self.engine.activity();
        let mut fresh: Vec<_> = activity.since(self.published).collect();
        fresh.reverse();
        for entry in fresh {
            self.broadcaster.send(WSEvent::Activity(ActivityEvent {
                timestamp: entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                message: entry.message.clone(),
            }));
        }
        self.published = activity.total_appended();
    }

    fn publish_status(&self) {
        self.broadcaster
            .send(WSEvent::Summary(self.engine.summary()));
        self.broadcaster.send(WSEvent::Slots(self.engine.snapshot()));
    }

    fn publish_config(&self) {
        if let Some(config) = self.engine.config() {
            match serde_json::to_value(config) {
                Ok(json) => self.broadcaster.send(WSEvent::Config(json)),
                Err(e) => warn!("[BITSPLIT] Failed to serialize config: {}", e),
            }
        }
    }
}
