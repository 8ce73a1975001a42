//! WebSocket Game Server
//!
//! Accepts WebSocket connections and binds each one to a session on the
//! [`GameHost`]. Also owns the game loop task.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::network::host::GameHost;
use crate::network::session::{ChannelConnection, Connection, Outbound, SessionId};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Time between game loop ticks.
    pub tick_interval: Duration,
    /// Messages buffered per connection before it counts as failed.
    pub outbound_capacity: usize,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: 1000,
            tick_interval: Duration::from_millis(crate::TICK_INTERVAL_MS),
            outbound_capacity: 64,
            version: crate::VERSION.to_string(),
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// The game being served.
    host: Arc<GameHost>,
    /// Open sockets and their sessions.
    clients: Arc<RwLock<BTreeMap<SocketAddr, SessionId>>>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a server for `host`.
    pub fn new(config: ServerConfig, host: Arc<GameHost>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            host,
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Run the server until [`GameServer::shutdown`] is called.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(
            "Game server v{} listening on {}",
            self.config.version, self.config.bind_addr
        );

        let game_loop = tokio::spawn(Arc::clone(&self.host).run_loop(self.config.tick_interval));

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.clients.read().await.len();
                            if clients_count >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        game_loop.abort();

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let host = Arc::clone(&self.host);
        let clients = Arc::clone(&self.clients);
        let capacity = self.config.outbound_capacity;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (connection, mut outbound_rx) = ChannelConnection::new(capacity);
            let connection = Arc::new(connection);
            let session_id = SessionId::new_v4();

            // Writer task: drains the outbound queue into the socket
            let writer = tokio::spawn(async move {
                while let Some(outbound) = outbound_rx.recv().await {
                    match outbound {
                        Outbound::Text(text) => {
                            if ws_sender.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        Outbound::Close => {
                            let _ = ws_sender.send(Message::Close(None)).await;
                            break;
                        }
                    }
                }
            });

            if let Err(e) = host.connect(session_id, connection.clone()).await {
                warn!("Could not register {} as session {}: {}", addr, session_id, e);
                connection.close();
                let _ = writer.await;
                return;
            }
            clients.write().await.insert(addr, session_id);

            // Reader loop: forwards text frames to the host
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                // Rejections are logged by the host
                                let _ = host.handle_message(&session_id, &text).await;
                            }
                            Some(Ok(Message::Binary(_))) => {
                                debug!("Ignoring binary frame from {}", addr);
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            // Cleanup
            host.disconnect(&session_id).await;
            clients.write().await.remove(&addr);
            if tokio::time::timeout(Duration::from_secs(1), writer).await.is_err() {
                debug!("Writer for {} did not finish in time", addr);
            }

            info!("Client {} cleaned up", addr);
        });
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Number of open client sockets.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// The hosted game.
    pub fn host(&self) -> &Arc<GameHost> {
        &self.host
    }
}
