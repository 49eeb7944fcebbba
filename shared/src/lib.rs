//! Wire protocol shared by the presence server and client.
//!
//! Every message is a JSON object carried in a single WebSocket text frame,
//! tagged by a snake_case `type` field. Liveness probes are WebSocket
//! ping/pong control frames and have no JSON representation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
pub const WS_PATH: &str = "/ws";
pub const HEALTH_PATH: &str = "/healthz";
pub const HEALTH_BODY: &str = "OK";

/// Messages sent from a client to the server
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Join { username: String },
}

/// Messages sent from the server to a client
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Registration accepted; `count` is the roster size including the new player
    JoinAck { count: usize },
    UsernameTaken { username: String },
    PlayerJoined { username: String },
    PlayerLeft { username: String },
}

pub fn encode<T: Serialize>(message: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

pub fn decode_client(text: &str) -> Result<ClientMessage, serde_json::Error> {
    serde_json::from_str(text)
}

pub fn decode_server(text: &str) -> Result<ServerMessage, serde_json::Error> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_join_wire_format() {
        let text = encode(&ClientMessage::Join {
            username: "alice".to_string(),
        })
        .unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({ "type": "join", "username": "alice" }));
    }

    #[test]
    fn test_server_wire_formats() {
        let cases = vec![
            (
                ServerMessage::JoinAck { count: 2 },
                json!({ "type": "join_ack", "count": 2 }),
            ),
            (
                ServerMessage::UsernameTaken {
                    username: "alice".to_string(),
                },
                json!({ "type": "username_taken", "username": "alice" }),
            ),
            (
                ServerMessage::PlayerJoined {
                    username: "bob".to_string(),
                },
                json!({ "type": "player_joined", "username": "bob" }),
            ),
            (
                ServerMessage::PlayerLeft {
                    username: "bob".to_string(),
                },
                json!({ "type": "player_left", "username": "bob" }),
            ),
        ];

        for (message, expected) in cases {
            let value: Value = serde_json::from_str(&encode(&message).unwrap()).unwrap();
            assert_eq!(value, expected);
        }
    }

    #[test]
    fn test_decode_join_from_browser_payload() {
        // Browsers may send extra fields; they are not an error.
        let message = decode_client(r#"{"type":"join","username":"carol","color":"red"}"#).unwrap();
        assert_eq!(
            message,
            ClientMessage::Join {
                username: "carol".to_string()
            }
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_client("not json").is_err());
        assert!(decode_client("").is_err());
        assert!(decode_client(r#"{"type":"shoot"}"#).is_err());
        assert!(decode_client(r#"{"type":"join"}"#).is_err());
        assert!(decode_client(r#"{"username":"dave"}"#).is_err());
        assert!(decode_client(r#"{"type":"join","username":42}"#).is_err());
    }

    #[test]
    fn test_decode_server_ack() {
        let message = decode_server(r#"{"type":"join_ack","count":3}"#).unwrap();
        assert_eq!(message, ServerMessage::JoinAck { count: 3 });
        assert!(decode_server(r#"{"type":"join_ack","count":-1}"#).is_err());
    }
}
