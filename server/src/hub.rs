//! Presence hub: the single owner of the roster and all connection records
//!
//! Socket tasks never touch shared state. They report what happened on their
//! socket as [`HubEvent`]s, and the hub applies those events and the periodic
//! liveness sweep one at a time from its own task. Everything the hub wants to
//! say to a client is queued on that client's [`Outbound`] channel.

use crate::connection::{ConnectionId, ConnectionManager, ConnectionState, Outbound};
use crate::roster::{JoinRejection, Roster};
use log::{debug, error, info, warn};
use shared::{ClientMessage, ServerMessage};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

/// Messages sent from socket tasks to the hub
#[derive(Debug)]
pub enum HubEvent {
    Opened {
        id: ConnectionId,
        addr: SocketAddr,
        outbound: mpsc::UnboundedSender<Outbound>,
    },
    Text {
        id: ConnectionId,
        text: String,
    },
    Pong {
        id: ConnectionId,
    },
    Closed {
        id: ConnectionId,
    },
    Shutdown,
}

/// Result of handling a join request, mostly useful for tests and logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Accepted { count: usize },
    Taken,
    Ignored,
}

pub struct PresenceHub {
    connections: ConnectionManager,
    roster: Roster,
}

impl PresenceHub {
    pub fn new() -> Self {
        Self {
            connections: ConnectionManager::new(),
            roster: Roster::new(),
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Applies a single event. Returns false once the hub should stop.
    pub fn handle_event(&mut self, event: HubEvent) -> bool {
        match event {
            HubEvent::Opened { id, addr, outbound } => {
                if !self.connections.add(id, addr, outbound) {
                    warn!("Duplicate connection id {} from {}", id, addr);
                }
            }
            HubEvent::Text { id, text } => self.handle_text(id, &text),
            HubEvent::Pong { id } => self.connections.mark_alive(id),
            HubEvent::Closed { id } => self.disconnect(id),
            HubEvent::Shutdown => {
                self.close_all();
                return false;
            }
        }
        true
    }

    /// Parses a text frame and dispatches it
    ///
    /// Anything that is not a well-formed join is dropped without a reply.
    pub fn handle_text(&mut self, id: ConnectionId, text: &str) {
        match shared::decode_client(text) {
            Ok(ClientMessage::Join { username }) => {
                self.join(id, &username);
            }
            Err(e) => {
                debug!("Ignoring message from connection {}: {}", id, e);
            }
        }
    }

    pub fn join(&mut self, id: ConnectionId, username: &str) -> JoinOutcome {
        if self.connections.get(id).is_none() {
            debug!("Join from unknown connection {}", id);
            return JoinOutcome::Ignored;
        }

        match self.roster.register(id, username) {
            Ok(count) => {
                if let Some(connection) = self.connections.get_mut(id) {
                    connection.state = ConnectionState::Joined {
                        username: username.to_string(),
                    };
                }
                info!(
                    "Player '{}' joined on connection {} ({} players)",
                    username, id, count
                );

                self.send_to(id, &ServerMessage::JoinAck { count });
                self.broadcast(
                    &ServerMessage::PlayerJoined {
                        username: username.to_string(),
                    },
                    Some(id),
                );
                JoinOutcome::Accepted { count }
            }
            Err(JoinRejection::UsernameTaken(name)) => {
                info!("Connection {} asked for taken username '{}'", id, name);
                self.send_to(id, &ServerMessage::UsernameTaken { username: name });
                JoinOutcome::Taken
            }
            Err(rejection @ JoinRejection::AlreadyJoined(_)) => {
                debug!("Ignoring join from connection {}: {}", id, rejection);
                JoinOutcome::Ignored
            }
        }
    }

    /// Forgets a connection and announces the departure of its player
    ///
    /// Unknown ids are ignored, so a forced close followed by the socket
    /// task's own close report produces a single announcement.
    pub fn disconnect(&mut self, id: ConnectionId) {
        let Some(connection) = self.connections.remove(id) else {
            return;
        };

        if !connection.is_joined() {
            return;
        }

        if let Some(player) = self.roster.remove(id) {
            info!(
                "Player '{}' left ({} players)",
                player.username,
                self.roster.len()
            );
            self.broadcast(
                &ServerMessage::PlayerLeft {
                    username: player.username,
                },
                None,
            );
        }
    }

    /// One heartbeat cycle: close connections that missed the last probe,
    /// then probe everyone else
    pub fn sweep(&mut self) -> Vec<ConnectionId> {
        let dead = self.connections.sweep();

        for id in &dead {
            warn!("Connection {} missed heartbeat, closing", id);
            if let Some(connection) = self.connections.get(*id) {
                connection.send(Outbound::Close);
            }
            self.disconnect(*id);
        }

        dead
    }

    fn close_all(&mut self) {
        for id in self.connections.ids() {
            if let Some(connection) = self.connections.remove(id) {
                connection.send(Outbound::Close);
            }
        }
        info!("Closed all connections");
    }

    fn send_to(&self, id: ConnectionId, message: &ServerMessage) {
        let Some(text) = Self::encode(message) else {
            return;
        };
        if let Some(connection) = self.connections.get(id) {
            if !connection.send(Outbound::Text(text)) {
                warn!("Failed to queue message for connection {}", id);
            }
        }
    }

    fn broadcast(&self, message: &ServerMessage, exclude: Option<ConnectionId>) {
        if let Some(text) = Self::encode(message) {
            let delivered = self.connections.broadcast(&Outbound::Text(text), exclude);
            debug!("Broadcast {:?} to {} connections", message, delivered);
        }
    }

    fn encode(message: &ServerMessage) -> Option<String> {
        match shared::encode(message) {
            Ok(text) => Some(text),
            Err(e) => {
                error!("Failed to encode {:?}: {}", message, e);
                None
            }
        }
    }

    /// Main hub loop
    ///
    /// Runs until a [`HubEvent::Shutdown`] arrives or every event sender has
    /// been dropped. The sweep shares the loop with event handling, so it
    /// never overlaps with itself or with a join.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<HubEvent>, heartbeat: Duration) {
        let mut sweep_interval = interval(heartbeat);
        sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Skip the first tick since it fires immediately
        sweep_interval.tick().await;

        info!("Presence hub started (heartbeat every {:?})", heartbeat);

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("All event senders dropped, hub stopping");
                        break;
                    };
                    if !self.handle_event(event) {
                        info!("Presence hub shutting down");
                        break;
                    }
                },

                _ = sweep_interval.tick() => {
                    let dead = self.sweep();
                    if !dead.is_empty() || !self.connections.is_empty() {
                        debug!(
                            "Heartbeat: {} connections, {} players, {} closed",
                            self.connections.len(),
                            self.roster.len(),
                            dead.len()
                        );
                    }
                },
            }
        }
    }
}

impl Default for PresenceHub {
    fn default() -> Self {
        Self::new()
    }
}
