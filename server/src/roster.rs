//! Authoritative roster of joined players
//!
//! The roster is the only place usernames are registered. Registration checks
//! for a duplicate and inserts in the same call, so as long as a single owner
//! drives it (the presence hub) two joins with the same name can never both
//! succeed.

use crate::connection::ConnectionId;
use std::fmt;

/// A participant that completed the join handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub connection: ConnectionId,
    pub username: String,
}

/// Reasons a registration can be refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinRejection {
    /// Another connection currently holds this username
    UsernameTaken(String),
    /// The connection already has a player registered
    AlreadyJoined(String),
}

impl fmt::Display for JoinRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinRejection::UsernameTaken(name) => write!(f, "username '{}' is taken", name),
            JoinRejection::AlreadyJoined(name) => {
                write!(f, "connection already joined as '{}'", name)
            }
        }
    }
}

/// Players in join order
#[derive(Debug, Default)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
        }
    }

    /// Registers `username` for `connection`
    ///
    /// Returns the roster size after registration. Usernames are compared
    /// exactly, so "Alice" and "alice" are different players.
    pub fn register(
        &mut self,
        connection: ConnectionId,
        username: &str,
    ) -> Result<usize, JoinRejection> {
        if let Some(existing) = self.find_by_connection(connection) {
            return Err(JoinRejection::AlreadyJoined(existing.username.clone()));
        }
        if self.is_taken(username) {
            return Err(JoinRejection::UsernameTaken(username.to_string()));
        }

        self.players.push(Player {
            connection,
            username: username.to_string(),
        });
        Ok(self.players.len())
    }

    /// Removes the player bound to `connection`, if any
    pub fn remove(&mut self, connection: ConnectionId) -> Option<Player> {
        let index = self
            .players
            .iter()
            .position(|player| player.connection == connection)?;
        Some(self.players.remove(index))
    }

    pub fn is_taken(&self, username: &str) -> bool {
        self.players.iter().any(|player| player.username == username)
    }

    pub fn find_by_connection(&self, connection: ConnectionId) -> Option<&Player> {
        self.players
            .iter()
            .find(|player| player.connection == connection)
    }

    pub fn usernames(&self) -> Vec<&str> {
        self.players
            .iter()
            .map(|player| player.username.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_distinct_usernames() {
        let mut roster = Roster::new();
        let names = ["alice", "bob", "carol", "dave", "erin"];

        for (i, name) in names.iter().enumerate() {
            let size = roster.register(i as ConnectionId + 1, name).unwrap();
            assert_eq!(size, i + 1);
        }

        assert_eq!(roster.len(), names.len());
        assert_eq!(roster.usernames(), names.to_vec());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let mut roster = Roster::new();
        roster.register(1, "alice").unwrap();

        let result = roster.register(2, "alice");
        assert_eq!(
            result,
            Err(JoinRejection::UsernameTaken("alice".to_string()))
        );
        assert_eq!(roster.len(), 1);
        assert!(roster.find_by_connection(2).is_none());
    }

    #[test]
    fn test_username_comparison_is_exact() {
        let mut roster = Roster::new();
        roster.register(1, "alice").unwrap();
        assert_eq!(roster.register(2, "Alice"), Ok(2));
    }

    #[test]
    fn test_second_join_from_same_connection() {
        let mut roster = Roster::new();
        roster.register(1, "alice").unwrap();

        let result = roster.register(1, "alicia");
        assert_eq!(
            result,
            Err(JoinRejection::AlreadyJoined("alice".to_string()))
        );
        assert_eq!(roster.len(), 1);
        assert!(!roster.is_taken("alicia"));
    }

    #[test]
    fn test_remove_frees_username() {
        let mut roster = Roster::new();
        roster.register(1, "alice").unwrap();
        roster.register(2, "bob").unwrap();

        let removed = roster.remove(1).unwrap();
        assert_eq!(removed.username, "alice");
        assert_eq!(roster.len(), 1);
        assert!(!roster.is_taken("alice"));

        assert_eq!(roster.register(3, "alice"), Ok(2));
        assert_eq!(roster.usernames(), vec!["bob", "alice"]);
    }

    #[test]
    fn test_remove_unknown_connection() {
        let mut roster = Roster::new();
        roster.register(1, "alice").unwrap();

        assert!(roster.remove(42).is_none());
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_empty_roster() {
        let roster = Roster::new();
        assert!(roster.is_empty());
        assert!(!roster.is_taken(""));
        assert!(roster.usernames().is_empty());
    }
}
