//! # Presence Server Library
//!
//! This library provides the presence server for the arena demo. It does not
//! simulate the game; it only tracks who is connected and tells everyone else
//! when somebody joins or leaves.
//!
//! ## Core Responsibilities
//!
//! ### Roster Management
//! Keeps the authoritative list of joined players and guarantees that no two
//! of them share a username. A duplicate join is answered with an explicit
//! `username_taken` rejection and leaves the connection open so the client
//! can try another name.
//!
//! ### Membership Broadcasting
//! Every successful join is acknowledged with the new roster size and
//! announced to all other open connections. Every departure of a joined
//! player is announced to everyone still connected.
//!
//! ### Liveness Checking
//! A periodic sweep pings every connection and closes the ones that failed
//! to answer the previous ping, so players whose tab crashed or whose
//! network dropped do not hold a roster slot forever.
//!
//! ## Architecture Design
//!
//! ### Single Owner for Shared State
//! The roster and all connection records live inside one hub task. Socket
//! tasks forward what they receive as events over a channel and the hub
//! handles them one at a time, interleaved with the sweep timer. The
//! username check and the insert can therefore never race.
//!
//! ### One Listener
//! WebSocket upgrades (`/ws`), the health check (`/healthz`) and static client
//! assets share a single HTTP listener.
//!
//! ## Module Organization
//!
//! - `roster`: registered players and username uniqueness
//! - `connection`: per-connection handshake state and liveness flags
//! - `hub`: the event loop applying joins, closes and sweeps
//! - `network`: HTTP routing and the per-socket frame pump
//! - `config`: command line and environment configuration
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind(ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod hub;
pub mod network;
pub mod roster;

pub use config::{Args, ServerConfig};
pub use error::ServerError;
pub use network::Server;
