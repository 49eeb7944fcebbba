//! Client-side view of the roster
//!
//! The client never sees the roster itself, only the size the server reports
//! in `join_ack` and the join/leave notifications after it. This module turns
//! that stream into a local player count and into the one decision the game
//! cares about: are other humans present (hide the bots) or is the player
//! alone (show them).

use log::{debug, info, warn};
use shared::ServerMessage;

/// Where the local player is in the join flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Choosing a username or waiting for the server to accept it
    Entering,
    /// Username accepted
    Lobby,
}

/// Change in bot visibility the game should apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotSignal {
    /// At least one other human is connected: bots stand down
    HumansPresent,
    /// The local player is alone: bots come back
    Alone,
}

/// The game-side collaborator that owns the bots
pub trait BotVisibility {
    fn hide_bots(&mut self);
    fn show_bots(&mut self);
}

impl BotSignal {
    pub fn apply_to<B: BotVisibility + ?Sized>(self, bots: &mut B) {
        match self {
            BotSignal::HumansPresent => bots.hide_bots(),
            BotSignal::Alone => bots.show_bots(),
        }
    }
}

/// What changed after handling a message or connection event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceUpdate {
    pub signal: Option<BotSignal>,
    /// Short text for the HUD notice area
    pub notice: Option<String>,
}

#[derive(Debug)]
pub struct PresenceState {
    player_count: usize,
    phase: Phase,
    humans_present: bool,
    connected: bool,
    username: Option<String>,
    pending: Option<String>,
    rejected: Option<String>,
}

impl PresenceState {
    pub fn new() -> Self {
        Self {
            player_count: 1,
            phase: Phase::Entering,
            humans_present: false,
            connected: false,
            username: None,
            pending: None,
            rejected: None,
        }
    }

    pub fn player_count(&self) -> usize {
        self.player_count
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn humans_present(&self) -> bool {
        self.humans_present
    }

    pub fn bots_visible(&self) -> bool {
        !self.humans_present
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Accepted username, if any
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Username sent to the server and not yet answered
    pub fn pending_username(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn rejected_username(&self) -> Option<&str> {
        self.rejected.as_deref()
    }

    /// Whether the entry prompt should accept input
    pub fn can_request_join(&self) -> bool {
        self.phase == Phase::Entering && self.pending.is_none()
    }

    /// Records a join request the network task is about to send
    pub fn request_join(&mut self, username: String) {
        self.rejected = None;
        self.pending = Some(username);
    }

    /// A connection was established
    ///
    /// The network task re-sends the last accepted username on every new
    /// connection, so the state mirrors that here.
    pub fn connection_opened(&mut self) {
        self.connected = true;
        if self.pending.is_none() {
            self.pending = self.username.clone();
        }
    }

    /// The connection closed or failed
    ///
    /// The true roster is unknown from here on, so the count falls back to
    /// just the local player and the bots are brought back.
    pub fn connection_lost(&mut self) -> PresenceUpdate {
        info!(
            "Connection lost with {} players known, assuming alone",
            self.player_count
        );
        self.connected = false;
        self.player_count = 1;
        self.humans_present = false;

        PresenceUpdate {
            signal: Some(BotSignal::Alone),
            notice: Some("Disconnected from server".to_string()),
        }
    }

    pub fn apply(&mut self, message: &ServerMessage) -> PresenceUpdate {
        match message {
            ServerMessage::JoinAck { count } => {
                if let Some(name) = self.pending.take() {
                    self.username = Some(name);
                }
                self.phase = Phase::Lobby;
                info!("Joined as {:?} with {} players", self.username, count);

                PresenceUpdate {
                    signal: self.set_count(*count),
                    notice: None,
                }
            }

            ServerMessage::UsernameTaken { username } => {
                warn!("Username '{}' is taken", username);
                self.pending = None;
                if self.username.as_deref() == Some(username.as_str()) {
                    self.username = None;
                }
                self.rejected = Some(username.clone());
                self.phase = Phase::Entering;

                PresenceUpdate {
                    signal: None,
                    notice: Some(format!("Username '{}' is taken", username)),
                }
            }

            ServerMessage::PlayerJoined { username } => {
                let signal = self.set_count(self.player_count + 1);
                debug!("{} joined, {} players", username, self.player_count);

                let notice = (signal == Some(BotSignal::HumansPresent))
                    .then(|| format!("{} joined the game!", username));
                PresenceUpdate { signal, notice }
            }

            ServerMessage::PlayerLeft { username } => {
                if self.player_count <= 1 {
                    warn!(
                        "{} left while no other players were known; count out of sync",
                        username
                    );
                    return PresenceUpdate::default();
                }

                let signal = self.set_count(self.player_count - 1);
                debug!("{} left, {} players", username, self.player_count);

                let notice =
                    (signal == Some(BotSignal::Alone)).then(|| "AIs have returned!".to_string());
                PresenceUpdate { signal, notice }
            }
        }
    }

    /// Updates the count and reports a bot signal only when the
    /// alone/not-alone threshold is crossed
    fn set_count(&mut self, count: usize) -> Option<BotSignal> {
        self.player_count = count.max(1);

        let humans_present = self.player_count >= 2;
        if humans_present == self.humans_present {
            return None;
        }
        self.humans_present = humans_present;

        Some(if humans_present {
            BotSignal::HumansPresent
        } else {
            BotSignal::Alone
        })
    }
}

impl Default for PresenceState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingBots {
        hidden: usize,
        shown: usize,
        visible: bool,
    }

    impl BotVisibility for RecordingBots {
        fn hide_bots(&mut self) {
            self.hidden += 1;
            self.visible = false;
        }

        fn show_bots(&mut self) {
            self.shown += 1;
            self.visible = true;
        }
    }

    fn joined(name: &str) -> ServerMessage {
        ServerMessage::PlayerJoined {
            username: name.to_string(),
        }
    }

    fn left(name: &str) -> ServerMessage {
        ServerMessage::PlayerLeft {
            username: name.to_string(),
        }
    }

    fn drive(state: &mut PresenceState, bots: &mut RecordingBots, message: &ServerMessage) {
        if let Some(signal) = state.apply(message).signal {
            signal.apply_to(bots);
        }
    }

    #[test]
    fn test_initial_state() {
        let state = PresenceState::new();
        assert_eq!(state.player_count(), 1);
        assert_eq!(state.phase(), Phase::Entering);
        assert!(state.bots_visible());
        assert!(!state.is_connected());
        assert!(state.can_request_join());
    }

    #[test]
    fn test_join_ack_sets_count_and_phase() {
        let mut state = PresenceState::new();
        state.request_join("alice".to_string());
        assert!(!state.can_request_join());

        let update = state.apply(&ServerMessage::JoinAck { count: 1 });

        assert_eq!(update, PresenceUpdate::default());
        assert_eq!(state.player_count(), 1);
        assert_eq!(state.phase(), Phase::Lobby);
        assert_eq!(state.username(), Some("alice"));
        assert_eq!(state.pending_username(), None);
    }

    #[test]
    fn test_join_ack_into_busy_lobby_hides_bots() {
        let mut state = PresenceState::new();
        state.request_join("carol".to_string());

        let update = state.apply(&ServerMessage::JoinAck { count: 3 });

        assert_eq!(update.signal, Some(BotSignal::HumansPresent));
        assert_eq!(state.player_count(), 3);
        assert!(!state.bots_visible());
    }

    #[test]
    fn test_join_then_leave_scenario() {
        let mut state = PresenceState::new();
        let mut bots = RecordingBots::default();

        drive(&mut state, &mut bots, &joined("bob"));
        assert_eq!(state.player_count(), 2);
        assert_eq!(bots.hidden, 1);
        assert!(!bots.visible);

        drive(&mut state, &mut bots, &left("bob"));
        assert_eq!(state.player_count(), 1);
        assert_eq!(bots.shown, 1);
        assert!(bots.visible);
        assert_eq!(bots.hidden, 1);
    }

    #[test]
    fn test_signals_only_on_threshold_crossing() {
        let mut state = PresenceState::new();
        let mut bots = RecordingBots::default();

        for name in ["bob", "carol", "dave"] {
            drive(&mut state, &mut bots, &joined(name));
        }
        assert_eq!(state.player_count(), 4);
        assert_eq!(bots.hidden, 1);

        drive(&mut state, &mut bots, &left("dave"));
        drive(&mut state, &mut bots, &left("carol"));
        assert_eq!(state.player_count(), 2);
        assert_eq!(bots.shown, 0);

        drive(&mut state, &mut bots, &left("bob"));
        assert_eq!(state.player_count(), 1);
        assert_eq!(bots.shown, 1);
    }

    #[test]
    fn test_notices() {
        let mut state = PresenceState::new();

        let update = state.apply(&joined("bob"));
        assert_eq!(update.notice.as_deref(), Some("bob joined the game!"));

        let update = state.apply(&joined("carol"));
        assert_eq!(update.notice, None);

        state.apply(&left("carol"));
        let update = state.apply(&left("bob"));
        assert_eq!(update.notice.as_deref(), Some("AIs have returned!"));
    }

    #[test]
    fn test_leave_when_alone_is_clamped() {
        let mut state = PresenceState::new();
        let update = state.apply(&left("ghost"));

        assert_eq!(update, PresenceUpdate::default());
        assert_eq!(state.player_count(), 1);
        assert!(state.bots_visible());
    }

    #[test]
    fn test_username_taken_returns_to_entry() {
        let mut state = PresenceState::new();
        state.request_join("alice".to_string());

        let update = state.apply(&ServerMessage::UsernameTaken {
            username: "alice".to_string(),
        });

        assert_eq!(update.signal, None);
        assert_eq!(update.notice.as_deref(), Some("Username 'alice' is taken"));
        assert_eq!(state.phase(), Phase::Entering);
        assert_eq!(state.rejected_username(), Some("alice"));
        assert_eq!(state.username(), None);
        assert!(state.can_request_join());

        state.request_join("alicia".to_string());
        assert_eq!(state.rejected_username(), None);
        state.apply(&ServerMessage::JoinAck { count: 2 });
        assert_eq!(state.username(), Some("alicia"));
    }

    #[test]
    fn test_connection_lost_resets_to_alone() {
        let mut state = PresenceState::new();
        let mut bots = RecordingBots::default();
        state.connection_opened();
        state.request_join("alice".to_string());
        drive(&mut state, &mut bots, &ServerMessage::JoinAck { count: 3 });

        let update = state.connection_lost();
        if let Some(signal) = update.signal {
            signal.apply_to(&mut bots);
        }

        assert_eq!(update.signal, Some(BotSignal::Alone));
        assert_eq!(state.player_count(), 1);
        assert!(!state.is_connected());
        assert!(bots.visible);
    }

    #[test]
    fn test_reconnect_rejoins_with_accepted_username() {
        let mut state = PresenceState::new();
        state.connection_opened();
        state.request_join("alice".to_string());
        state.apply(&ServerMessage::JoinAck { count: 2 });
        state.connection_lost();

        state.connection_opened();
        assert_eq!(state.pending_username(), Some("alice"));

        let update = state.apply(&ServerMessage::JoinAck { count: 2 });
        assert_eq!(update.signal, Some(BotSignal::HumansPresent));
        assert_eq!(state.username(), Some("alice"));
        assert_eq!(state.phase(), Phase::Lobby);
    }
}
