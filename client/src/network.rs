//! Presence connection with automatic reconnection
//!
//! The network task owns the single WebSocket to the server. It reports
//! everything that matters to the game as [`NetworkEvent`]s and takes
//! [`ClientCommand`]s back; the game loop polls both channels without
//! blocking, so the task runs on its own thread with its own runtime.

use crate::error::ClientError;
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientMessage, ServerMessage};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Events from the network task to the game loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    Connected,
    Message(ServerMessage),
    ConnectionLost,
}

/// Requests from the game loop to the network task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Join(String),
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Full WebSocket URL, e.g. `ws://127.0.0.1:3000/ws`
    pub url: String,
    /// Delay before reconnecting; `None` disables reconnection
    pub reconnect_delay: Option<Duration>,
}

impl NetworkConfig {
    /// Builds the config for a `host:port` server address
    pub fn for_server(server: &str, reconnect_delay: Option<Duration>) -> Self {
        Self {
            url: format!("ws://{}{}", server, shared::WS_PATH),
            reconnect_delay,
        }
    }
}

/// How a single connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Lost,
    Shutdown,
}

pub struct NetworkClient {
    config: NetworkConfig,
    /// Username sent and not yet answered, or waiting for a connection
    pending: Option<String>,
    /// Last username the server accepted; re-sent after a reconnect
    accepted: Option<String>,
    events: mpsc::UnboundedSender<NetworkEvent>,
    commands: mpsc::UnboundedReceiver<ClientCommand>,
}

impl NetworkClient {
    pub fn new(
        config: NetworkConfig,
        username: Option<String>,
        events: mpsc::UnboundedSender<NetworkEvent>,
        commands: mpsc::UnboundedReceiver<ClientCommand>,
    ) -> Self {
        Self {
            config,
            pending: username,
            accepted: None,
            events,
            commands,
        }
    }

    /// Connects and keeps reconnecting until shut down
    pub async fn run(mut self) {
        loop {
            info!("Connecting to {}", self.config.url);

            match connect_async(self.config.url.as_str()).await {
                Ok((stream, _)) => {
                    info!("Connected to {}", self.config.url);
                    self.emit(NetworkEvent::Connected);

                    let end = self.session(stream).await;
                    self.emit(NetworkEvent::ConnectionLost);
                    if end == SessionEnd::Shutdown {
                        return;
                    }
                    warn!("Connection to {} lost", self.config.url);
                }
                Err(e) => {
                    warn!("Failed to connect to {}: {}", self.config.url, e);
                    self.emit(NetworkEvent::ConnectionLost);
                }
            }

            let Some(delay) = self.config.reconnect_delay else {
                info!("Reconnection disabled, network task stopping");
                return;
            };
            if self.wait_before_retry(delay).await == SessionEnd::Shutdown {
                return;
            }
        }
    }

    async fn session(&mut self, stream: WsStream) -> SessionEnd {
        let (mut write, mut read) = stream.split();

        if self.pending.is_none() {
            self.pending = self.accepted.clone();
        }
        if let Some(username) = self.pending.clone() {
            if let Err(e) = Self::send_join(&mut write, &username).await {
                warn!("Failed to send join: {}", e);
                return SessionEnd::Lost;
            }
        }

        loop {
            tokio::select! {
                incoming = read.next() => match incoming {
                    Some(Ok(Message::Text(text))) => match shared::decode_server(text.as_str()) {
                        Ok(message) => {
                            self.observe(&message);
                            self.emit(NetworkEvent::Message(message));
                        }
                        Err(e) => debug!("Ignoring server message: {}", e),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        info!("Server closed connection: {:?}", frame);
                        return SessionEnd::Lost;
                    }
                    // Pings are answered by the socket on the next read
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        return SessionEnd::Lost;
                    }
                    None => return SessionEnd::Lost,
                },

                command = self.commands.recv() => match command {
                    Some(ClientCommand::Join(username)) => {
                        self.pending = Some(username.clone());
                        if let Err(e) = Self::send_join(&mut write, &username).await {
                            warn!("Failed to send join: {}", e);
                            return SessionEnd::Lost;
                        }
                    }
                    Some(ClientCommand::Shutdown) | None => {
                        let _ = write.send(Message::Close(None)).await;
                        return SessionEnd::Shutdown;
                    }
                },
            }
        }
    }

    /// Sleeps out the reconnect delay while still taking commands
    async fn wait_before_retry(&mut self, delay: Duration) -> SessionEnd {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return SessionEnd::Lost,
                command = self.commands.recv() => match command {
                    Some(ClientCommand::Join(username)) => self.pending = Some(username),
                    Some(ClientCommand::Shutdown) | None => return SessionEnd::Shutdown,
                },
            }
        }
    }

    /// Tracks which username the server accepted
    fn observe(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::JoinAck { .. } => {
                if let Some(username) = self.pending.take() {
                    self.accepted = Some(username);
                }
            }
            ServerMessage::UsernameTaken { username } => {
                self.pending = None;
                if self.accepted.as_ref() == Some(username) {
                    self.accepted = None;
                }
            }
            ServerMessage::PlayerJoined { .. } | ServerMessage::PlayerLeft { .. } => {}
        }
    }

    async fn send_join<S>(write: &mut S, username: &str) -> Result<(), ClientError>
    where
        S: futures::Sink<Message> + Unpin,
        S::Error: std::fmt::Display,
    {
        let text = shared::encode(&ClientMessage::Join {
            username: username.to_string(),
        })?;
        debug!("Sending join as '{}'", username);
        write
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::BrokenPipe, e.to_string()))?;
        Ok(())
    }

    fn emit(&self, event: NetworkEvent) {
        if self.events.send(event).is_err() {
            debug!("Game loop is gone, dropping network event");
        }
    }
}

/// Game-loop side of a network task running on its own thread
pub struct NetworkHandle {
    events: mpsc::UnboundedReceiver<NetworkEvent>,
    commands: mpsc::UnboundedSender<ClientCommand>,
    thread: Option<JoinHandle<()>>,
}

impl NetworkHandle {
    /// Starts the network task on a dedicated thread
    pub fn spawn(config: NetworkConfig, username: Option<String>) -> Result<Self, ClientError> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let client = NetworkClient::new(config, username, events_tx, commands_rx);

        let thread = std::thread::Builder::new()
            .name("network".to_string())
            .spawn(move || runtime.block_on(client.run()))?;

        Ok(Self {
            events: events_rx,
            commands: commands_tx,
            thread: Some(thread),
        })
    }

    /// Drains every event received since the last call
    pub fn poll(&mut self) -> Vec<NetworkEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn join(&self, username: String) {
        if self.commands.send(ClientCommand::Join(username)).is_err() {
            error!("Network task is not running");
        }
    }

    /// Stops the network task and waits for its thread
    pub fn shutdown(mut self) {
        let _ = self.commands.send(ClientCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Network thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> (
        NetworkClient,
        mpsc::UnboundedReceiver<NetworkEvent>,
        mpsc::UnboundedSender<ClientCommand>,
    ) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let config = NetworkConfig::for_server("127.0.0.1:1", None);
        (
            NetworkClient::new(config, Some("alice".to_string()), events_tx, commands_rx),
            events_rx,
            commands_tx,
        )
    }

    #[test]
    fn test_config_url() {
        let config = NetworkConfig::for_server("example.com:3000", Some(DEFAULT_RECONNECT_DELAY));
        assert_eq!(config.url, "ws://example.com:3000/ws");
        assert_eq!(config.reconnect_delay, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_observe_tracks_accepted_username() {
        let (mut client, _events, _commands) = test_client();

        client.observe(&ServerMessage::JoinAck { count: 1 });
        assert_eq!(client.accepted.as_deref(), Some("alice"));
        assert_eq!(client.pending, None);

        client.observe(&ServerMessage::PlayerJoined {
            username: "bob".to_string(),
        });
        assert_eq!(client.accepted.as_deref(), Some("alice"));
    }

    #[test]
    fn test_observe_forgets_rejected_username() {
        let (mut client, _events, _commands) = test_client();

        client.observe(&ServerMessage::UsernameTaken {
            username: "alice".to_string(),
        });
        assert_eq!(client.pending, None);
        assert_eq!(client.accepted, None);
    }

    #[tokio::test]
    async fn test_unreachable_server_without_reconnect() {
        let (client, mut events, _commands) = test_client();

        client.run().await;

        assert_eq!(events.recv().await, Some(NetworkEvent::ConnectionLost));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_wait_takes_commands() {
        let (mut client, _events, commands) = test_client();
        commands.send(ClientCommand::Join("bob".to_string())).unwrap();
        commands.send(ClientCommand::Shutdown).unwrap();

        let end = client.wait_before_retry(Duration::from_secs(60)).await;

        assert_eq!(end, SessionEnd::Shutdown);
        assert_eq!(client.pending.as_deref(), Some("bob"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_wait_elapses() {
        let (mut client, _events, _commands) = test_client();
        let end = client.wait_before_retry(Duration::from_secs(3)).await;
        assert_eq!(end, SessionEnd::Lost);
    }
}
