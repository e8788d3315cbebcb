use crate::broadcast::types::WSEvent;
use crate::config::broadcast::WebsocketConfig;
use crate::constants::ACTIVITY_HISTORY_CACHE;
use futures_util::{SinkExt, StreamExt};
use log::{error, info, warn};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Latest stateful events, replayed to every new dashboard connection.
#[derive(Default)]
struct EventCache {
    config: Option<WSEvent>,
    info: Option<WSEvent>,
    summary: Option<WSEvent>,
    slots: Option<WSEvent>,
    market_update: Option<WSEvent>,
    activity: VecDeque<WSEvent>,
}

impl EventCache {
    fn remember(&mut self, event: &WSEvent) {
        match event {
            WSEvent::Config(_) => self.config = Some(event.clone()),
            WSEvent::Info(_) => self.info = Some(event.clone()),
            WSEvent::Summary(_) => self.summary = Some(event.clone()),
            WSEvent::Slots(_) => self.slots = Some(event.clone()),
            WSEvent::MarketUpdate(_) => self.market_update = Some(event.clone()),
            WSEvent::Activity(_) => {
                if self.activity.len() >= ACTIVITY_HISTORY_CACHE {
                    self.activity.pop_front();
                }
                self.activity.push_back(event.clone());
            }
            WSEvent::Error(_) => {}
        }
    }

    /// Replay order: config, info, summary, slots, market, then activity oldest first.
    fn replay(&self) -> Vec<WSEvent> {
        [
            &self.config,
            &self.info,
            &self.summary,
            &self.slots,
            &self.market_update,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .chain(self.activity.iter().cloned())
        .collect()
    }
}

type SharedCache = Arc<Mutex<EventCache>>;

fn lock(cache: &SharedCache) -> MutexGuard<'_, EventCache> {
    cache.lock().unwrap_or_else(|e| e.into_inner())
}

/// Fan-out of dashboard events to WebSocket clients and in-process subscribers.
#[derive(Clone)]
pub struct StatusBroadcaster {
    sender: broadcast::Sender<WSEvent>,
    cache: SharedCache,
}

impl StatusBroadcaster {
    /// Creates the broadcaster; with a config it also spawns the WebSocket server.
    pub fn new(config: Option<WebsocketConfig>) -> Self {
        let (sender, _) = broadcast::channel(100);
        let cache: SharedCache = Arc::new(Mutex::new(EventCache::default()));

        if let Some(conf) = config {
            let sender_clone = sender.clone();
            let cache_clone = cache.clone();
            tokio::spawn(async move {
                if let Err(e) = run_server(conf.host, conf.port, sender_clone, cache_clone).await {
                    error!("WebSocket Server failed: {}", e);
                }
            });
        }

        Self { sender, cache }
    }

    pub fn send(&self, event: WSEvent) {
        lock(&self.cache).remember(&event);

        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WSEvent> {
        self.sender.subscribe()
    }

    /// Events a newly connected client receives before the live stream.
    pub fn initial_events(&self) -> Vec<WSEvent> {
        lock(&self.cache).replay()
    }
}

async fn run_server(
    host: String,
    port: u16,
    sender: broadcast::Sender<WSEvent>,
    cache: SharedCache,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;
    info!("WebSocket Status Server listening on: ws://{}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let sender_clone = sender.clone();
        let cache_clone = cache.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, sender_clone, cache_clone).await {
                warn!("Error handling connection from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    sender: broadcast::Sender<WSEvent>,
    cache: SharedCache,
) -> anyhow::Result<()> {
    info!("New WebSocket connection: {}", peer_addr);

    let ws_stream = accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Subscribe before replaying so nothing sent in between is lost
    let mut rx = sender.subscribe();

    let initial = lock(&cache).replay();
    for event in initial {
        let json_str = serde_json::to_string(&event)?;
        ws_sender.send(Message::Text(json_str)).await?;
    }

    loop {
        tokio::select! {
            msg_res = rx.recv() => {
                match msg_res {
                    Ok(event) => {
                        let json_str = serde_json::to_string(&event)?;
                        ws_sender.send(Message::Text(json_str)).await?;
                    }
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        warn!("Client {} lagged by {} messages", peer_addr, count);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            // Clients only listen; anything they send besides Close is ignored
            client_msg = ws_receiver.next() => {
                match client_msg {
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", peer_addr);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", peer_addr, e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    Ok(())
}
