//! JSON envelopes exchanged over the game socket.
//!
//! Every frame carries exactly one object tagged by `"type"`. Inbound
//! envelopes are decoded in two steps so that a well-formed envelope with a
//! type we do not know can be told apart from garbage: the former is ignored,
//! the latter is a [`ParseError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use voxsync_engine::{BlockType, PlayerRecord, Position, Rotation};

/// Why an inbound frame could not be turned into an envelope.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("envelope has no string \"type\" field")]
    MissingType,
    #[error("malformed {kind} envelope: {source}")]
    Invalid {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Client-to-server envelopes the dispatcher understands.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Connect {
        login: String,
        #[serde(default)]
        password: String,
    },
    Move {
        position: Position,
    },
    GetChunk {
        position: Position,
    },
    PlaceBlock {
        position: Position,
        block_type: BlockType,
    },
    DestroyBlock {
        position: Position,
    },
    GetPlayers,
}

impl ClientMessage {
    const KINDS: [&'static str; 6] = [
        "connect",
        "move",
        "get_chunk",
        "place_block",
        "destroy_block",
        "get_players",
    ];

    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Connect { .. } => "connect",
            ClientMessage::Move { .. } => "move",
            ClientMessage::GetChunk { .. } => "get_chunk",
            ClientMessage::PlaceBlock { .. } => "place_block",
            ClientMessage::DestroyBlock { .. } => "destroy_block",
            ClientMessage::GetPlayers => "get_players",
        }
    }
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Message(ClientMessage),
    /// Valid envelope with a `type` nobody handles.
    Unknown(String),
}

pub fn decode(raw: &str) -> Result<Inbound, ParseError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(ParseError::Json)?;
    let kind = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or(ParseError::MissingType)?
        .to_owned();

    if !ClientMessage::KINDS.contains(&kind.as_str()) {
        return Ok(Inbound::Unknown(kind));
    }
    serde_json::from_value(value)
        .map(Inbound::Message)
        .map_err(|source| ParseError::Invalid { kind, source })
}

/// Server-to-client envelopes. Borrowed where the payload already lives in
/// server state so a chunk is serialized straight from the store.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage<'a> {
    Connected {
        message: &'a str,
        position: Position,
        rotation: Rotation,
    },
    PlayerConnected {
        player_id: &'a str,
        position: Position,
    },
    PlayerMoved {
        #[serde(skip_serializing_if = "Option::is_none")]
        player_id: Option<&'a str>,
        position: Position,
    },
    PlayerDisconnected {
        #[serde(skip_serializing_if = "Option::is_none")]
        player_id: Option<&'a str>,
    },
    ChunkData {
        position: Position,
        blocks: &'a [BlockType],
    },
    BlockPlaced {
        position: Position,
        block_type: BlockType,
    },
    BlockDestroyed {
        position: Position,
    },
    PlayersList {
        players: Vec<PlayerSummary<'a>>,
    },
}

/// Public projection of a player record. Credentials never leave the server.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSummary<'a> {
    pub player_id: &'a str,
    pub position: Position,
}

impl<'a> From<&'a PlayerRecord> for PlayerSummary<'a> {
    fn from(record: &'a PlayerRecord) -> Self {
        Self {
            player_id: &record.login,
            position: record.position,
        }
    }
}

impl ServerMessage<'_> {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_connect() {
        let msg = decode(r#"{"type":"connect","login":"alice","password":"x"}"#).unwrap();
        assert_eq!(
            msg,
            Inbound::Message(ClientMessage::Connect {
                login: "alice".into(),
                password: "x".into(),
            })
        );
    }

    #[test]
    fn connect_without_password_defaults_to_empty() {
        let msg = decode(r#"{"type":"connect","login":"bob"}"#).unwrap();
        assert!(matches!(
            msg,
            Inbound::Message(ClientMessage::Connect { password, .. }) if password.is_empty()
        ));
    }

    #[test]
    fn decodes_place_block_with_extra_fields() {
        let raw = r#"{"type":"place_block","position":{"x":1,"y":2.5,"z":-3},"block_type":4,"login":"x"}"#;
        let Inbound::Message(ClientMessage::PlaceBlock { position, block_type }) =
            decode(raw).unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(position, Position::new(1.0, 2.5, -3.0));
        assert_eq!(block_type, BlockType::new(4));
    }

    #[test]
    fn unknown_type_is_not_an_error() {
        assert_eq!(
            decode(r#"{"type":"dance"}"#).unwrap(),
            Inbound::Unknown("dance".into())
        );
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(decode("{not json"), Err(ParseError::Json(_))));
        assert!(matches!(decode(r#"{"login":"a"}"#), Err(ParseError::MissingType)));
        assert!(matches!(decode(r#"{"type":7}"#), Err(ParseError::MissingType)));
        assert!(matches!(
            decode(r#"{"type":"move"}"#),
            Err(ParseError::Invalid { kind, .. }) if kind == "move"
        ));
        assert!(matches!(
            decode(r#"{"type":"place_block","position":{"x":0,"y":0,"z":0},"block_type":999}"#),
            Err(ParseError::Invalid { .. })
        ));
    }

    #[test]
    fn encodes_wire_shapes() {
        let v: serde_json::Value = serde_json::from_str(
            &ServerMessage::PlayerConnected {
                player_id: "alice",
                position: Position::new(1.0, 256.0, -2.0),
            }
            .encode()
            .unwrap(),
        )
        .unwrap();
        assert_eq!(
            v,
            json!({"type":"player_connected","player_id":"alice","position":{"x":1.0,"y":256.0,"z":-2.0}})
        );

        let v: serde_json::Value = serde_json::from_str(
            &ServerMessage::PlayerDisconnected { player_id: None }.encode().unwrap(),
        )
        .unwrap();
        assert_eq!(v, json!({"type":"player_disconnected"}));
    }

    #[test]
    fn players_list_hides_passwords() {
        let record = PlayerRecord::new("alice", "secret", Position::ORIGIN);
        let text = ServerMessage::PlayersList {
            players: vec![PlayerSummary::from(&record)],
        }
        .encode()
        .unwrap();
        assert!(!text.contains("secret"));
        assert!(text.contains(r#""player_id":"alice""#));
    }
}
