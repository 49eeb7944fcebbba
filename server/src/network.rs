//! HTTP front end: WebSocket upgrades, health check and static assets
//!
//! One listener serves everything. Each upgraded socket gets its own task
//! that shuttles frames between the socket and the presence hub; the hub
//! task itself is spawned by [`Server::run_until`].

use crate::config::ServerConfig;
use crate::connection::{ConnectionId, Outbound};
use crate::error::ServerError;
use crate::hub::{HubEvent, PresenceHub};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::services::ServeDir;

/// State shared by every request handler
#[derive(Clone)]
struct AppState {
    events: mpsc::UnboundedSender<HubEvent>,
    next_id: Arc<AtomicU64>,
}

impl AppState {
    fn allocate_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Bound presence server, ready to run
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        if config.heartbeat.is_zero() {
            return Err(ServerError::InvalidHeartbeat);
        }

        let addr = config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until the process is killed
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Serves until `shutdown` completes, then closes every connection
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let hub = tokio::spawn(PresenceHub::new().run(events_rx, self.config.heartbeat));

        let state = AppState {
            events: events_tx.clone(),
            next_id: Arc::new(AtomicU64::new(1)),
        };
        let app = router(state, &self.config);

        info!(
            "Serving static assets from {}",
            self.config.static_dir.display()
        );

        let result = axum::serve(
            self.listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Shutdown requested");
            if events_tx.send(HubEvent::Shutdown).is_err() {
                warn!("Presence hub already stopped");
            }
        })
        .await;

        if let Err(e) = hub.await {
            error!("Presence hub task failed: {}", e);
        }

        result.map_err(ServerError::from)
    }
}

fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route(shared::HEALTH_PATH, get(health))
        .route(shared::WS_PATH, get(ws_handler))
        .fallback_service(ServeDir::new(&config.static_dir))
        .with_state(state)
}

async fn health() -> &'static str {
    shared::HEALTH_BODY
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, addr, state))
}

/// Pumps frames between one socket and the hub until either side closes
async fn handle_socket(socket: WebSocket, addr: SocketAddr, state: AppState) {
    let id = state.allocate_id();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();

    if state
        .events
        .send(HubEvent::Opened {
            id,
            addr,
            outbound: outbound_tx,
        })
        .is_err()
    {
        warn!("Rejecting connection from {}: hub is not running", addr);
        return;
    }

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            incoming = stream.next() => {
                let event = match incoming {
                    Some(Ok(Message::Text(text))) => HubEvent::Text {
                        id,
                        text: text.as_str().to_owned(),
                    },
                    Some(Ok(Message::Pong(_))) => HubEvent::Pong { id },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        // Pings are answered by the socket itself; binary is not part of the protocol
                        continue;
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error on connection {}: {}", id, e);
                        break;
                    }
                };
                if state.events.send(event).is_err() {
                    break;
                }
            },

            outbound = outbound_rx.recv() => {
                let result = match outbound {
                    Some(Outbound::Text(text)) => sink.send(Message::Text(text.into())).await,
                    Some(Outbound::Ping) => sink.send(Message::Ping(Vec::new().into())).await,
                    Some(Outbound::Close) | None => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                };
                if let Err(e) = result {
                    debug!("Send to connection {} failed: {}", id, e);
                    break;
                }
            },
        }
    }

    // The hub ignores this if it already dropped the connection
    let _ = state.events.send(HubEvent::Closed { id });
}
