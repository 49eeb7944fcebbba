//! Per-connection state and liveness tracking
//!
//! Each open WebSocket is represented by a [`Connection`] record owned by the
//! presence hub. The record carries the explicit handshake state, the
//! liveness flag used by the heartbeat sweep, and the sending half of the
//! queue drained by the connection's socket task.

use log::{debug, info};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;

/// Server-assigned identifier, unique for the lifetime of the process
pub type ConnectionId = u64;

/// Frames queued for a connection's socket task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Ping,
    /// Close the socket and stop the task
    Close,
}

/// Where a connection is in the join handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Joined { username: String },
}

#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    pub state: ConnectionState,
    /// Cleared by each sweep, set again by a pong
    pub alive: bool,
    pub connected_at: Instant,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        addr: SocketAddr,
        outbound: mpsc::UnboundedSender<Outbound>,
    ) -> Self {
        Self {
            id,
            addr,
            state: ConnectionState::Connected,
            alive: true,
            connected_at: Instant::now(),
            outbound,
        }
    }

    /// Queues a frame; returns false if the socket task has already exited
    pub fn send(&self, frame: Outbound) -> bool {
        self.outbound.send(frame).is_ok()
    }

    pub fn username(&self) -> Option<&str> {
        match &self.state {
            ConnectionState::Joined { username } => Some(username),
            ConnectionState::Connected => None,
        }
    }

    pub fn is_joined(&self) -> bool {
        matches!(self.state, ConnectionState::Joined { .. })
    }
}

/// All currently open connections
pub struct ConnectionManager {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    /// Tracks a newly opened connection
    ///
    /// Returns false if the id is already in use, in which case the existing
    /// record is kept.
    pub fn add(
        &mut self,
        id: ConnectionId,
        addr: SocketAddr,
        outbound: mpsc::UnboundedSender<Outbound>,
    ) -> bool {
        if self.connections.contains_key(&id) {
            return false;
        }
        info!("Connection {} opened from {}", id, addr);
        self.connections
            .insert(id, Connection::new(id, addr, outbound));
        true
    }

    pub fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        let connection = self.connections.remove(&id)?;
        info!(
            "Connection {} from {} closed after {:.1}s",
            id,
            connection.addr,
            connection.connected_at.elapsed().as_secs_f32()
        );
        Some(connection)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    /// Records a heartbeat reply
    pub fn mark_alive(&mut self, id: ConnectionId) {
        if let Some(connection) = self.connections.get_mut(&id) {
            connection.alive = true;
        }
    }

    /// Runs one heartbeat cycle
    ///
    /// Connections that did not answer the previous probe are returned for
    /// the caller to close. Every other connection has its liveness flag
    /// cleared and is sent a fresh ping.
    pub fn sweep(&mut self) -> Vec<ConnectionId> {
        let mut dead = Vec::new();

        for connection in self.connections.values_mut() {
            if !connection.alive {
                dead.push(connection.id);
                continue;
            }
            connection.alive = false;
            if !connection.send(Outbound::Ping) {
                debug!("Ping to connection {} not queued", connection.id);
            }
        }

        dead.sort_unstable();
        dead
    }

    /// Sends `frame` to every open connection except `exclude`
    ///
    /// Returns the number of connections the frame was queued for.
    pub fn broadcast(&self, frame: &Outbound, exclude: Option<ConnectionId>) -> usize {
        let mut delivered = 0;
        for connection in self.connections.values() {
            if Some(connection.id) == exclude {
                continue;
            }
            if connection.send(frame.clone()) {
                delivered += 1;
            } else {
                debug!("Broadcast to connection {} not queued", connection.id);
            }
        }
        delivered
    }

    pub fn ids(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self.connections.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
