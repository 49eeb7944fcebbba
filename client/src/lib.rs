//! # Arena Client Library
//!
//! Client side of the arena presence demo. The local game runs on its own;
//! the server only tells it how many humans are around, and the client uses
//! that to decide whether the AI bots should be in the arena.
//!
//! ## Module Organization
//!
//! ### Presence Module (`presence`)
//! Local player count, join flow and the bot visibility decision:
//! - `join_ack` sets the count
//! - `player_joined` and `player_left` adjust it
//! - crossing the two-player threshold hides or shows the bots
//!
//! ### Network Module (`network`)
//! The WebSocket connection to the server:
//! - JSON text frames in both directions
//! - automatic reconnection with the last accepted username
//! - runs on its own thread so the render loop never blocks
//!
//! ### Game Module (`game`)
//! The arena and its wandering bots, which implement `BotVisibility`.
//!
//! ### Input and Rendering Modules
//! Username entry and drawing of the arena and HUD.
//!
//! ## Usage Example
//!
//! ```no_run
//! use client::game::Arena;
//! use client::network::{NetworkConfig, NetworkEvent, NetworkHandle};
//! use client::presence::PresenceState;
//!
//! let config = NetworkConfig::for_server("127.0.0.1:3000", None);
//! let mut network = NetworkHandle::spawn(config, Some("alice".to_string()))?;
//! let mut presence = PresenceState::new();
//! let mut arena = Arena::new(5, 800.0, 600.0);
//!
//! for event in network.poll() {
//!     let update = match event {
//!         NetworkEvent::Connected => {
//!             presence.connection_opened();
//!             continue;
//!         }
//!         NetworkEvent::Message(message) => presence.apply(&message),
//!         NetworkEvent::ConnectionLost => presence.connection_lost(),
//!     };
//!     if let Some(signal) = update.signal {
//!         signal.apply_to(&mut arena);
//!     }
//! }
//! # Ok::<(), client::error::ClientError>(())
//! ```

pub mod error;
pub mod game;
pub mod input;
pub mod network;
pub mod presence;
pub mod rendering;
