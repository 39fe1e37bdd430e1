//! Envelope routing against a bare `WorldState`, observed through the same
//! channels the socket writers drain.

mod common;

use common::{drain, types};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use tokio::sync::mpsc;
use voxsync_engine::{BlockType, ChunkError, Position, WorldConfig};
use voxsync_server::connection_registry::{ConnId, Connection, Frame};
use voxsync_server::dispatch::{Outcome, route};
use voxsync_server::protocol::ClientMessage;
use voxsync_server::state::WorldState;

struct Harness {
    world: WorldState,
    rng: StdRng,
    next_id: u64,
}

impl Harness {
    fn new() -> Self {
        Self {
            world: WorldState::new(WorldConfig::default()),
            rng: StdRng::seed_from_u64(42),
            next_id: 1,
        }
    }

    fn open(&mut self) -> (Connection, mpsc::UnboundedReceiver<Frame>) {
        let id = ConnId(self.next_id);
        self.next_id += 1;
        Connection::channel(id)
    }

    fn send(&mut self, conn: &Connection, msg: ClientMessage) -> Outcome {
        route(&mut self.world, conn, msg, &mut self.rng)
    }

    fn connect(&mut self, conn: &Connection, login: &str) -> Outcome {
        self.send(
            conn,
            ClientMessage::Connect {
                login: login.into(),
                password: "x".into(),
            },
        )
    }
}

fn pos(x: f64, y: f64, z: f64) -> Position {
    Position::new(x, y, z)
}

#[test]
fn connect_replies_and_broadcasts_spawn() {
    let mut h = Harness::new();
    let (bob, mut bob_rx) = h.open();
    h.connect(&bob, "bob");
    drain(&mut bob_rx);

    let (lurker, mut lurker_rx) = h.open();
    let (alice, mut alice_rx) = h.open();
    let outcome = h.connect(&alice, "alice");
    assert_eq!(outcome, Outcome::Broadcast { recipients: 2 });

    let spawn = h.world.players.get("alice").unwrap().position;
    let spawn_json = serde_json::to_value(spawn).unwrap();

    let frames = drain(&mut alice_rx);
    assert_eq!(types(&frames), ["connected", "player_connected"]);
    assert_eq!(frames[0]["position"], spawn_json);
    assert_eq!(frames[0]["rotation"], json!({"x": 0.0, "y": 0.0, "z": 0.0}));
    assert_eq!(
        frames[1],
        json!({"type": "player_connected", "player_id": "alice", "position": spawn_json})
    );

    assert_eq!(drain(&mut bob_rx), [frames[1].clone()]);
    // Not bound yet, so not a broadcast recipient.
    assert!(drain(&mut lurker_rx).is_empty());
    assert!(h.world.connections.lookup(lurker.id()).is_none());
    assert_eq!(h.world.players.len(), 2);
}

#[test]
fn reconnect_reuses_the_record() {
    let mut h = Harness::new();
    let (a, mut rx) = h.open();
    h.connect(&a, "alice");
    h.send(&a, ClientMessage::Move { position: pos(9.0, 256.0, 9.0) });
    drain(&mut rx);

    let (b, mut rx_b) = h.open();
    h.connect(&b, "alice");
    let frames = drain(&mut rx_b);
    assert_eq!(frames[0]["message"], "Reconnected with stored data");
    assert_eq!(frames[0]["position"], json!({"x": 9.0, "y": 256.0, "z": 9.0}));
    assert_eq!(h.world.players.len(), 1);
}

#[test]
fn moves_are_last_write_wins_with_one_broadcast_each() {
    let mut h = Harness::new();
    let (a, mut rx) = h.open();
    h.connect(&a, "alice");
    drain(&mut rx);

    let path = [pos(1.0, 2.0, 3.0), pos(-4.5, 256.0, 0.25), pos(7.0, 7.0, 7.0)];
    for p in path {
        h.send(&a, ClientMessage::Move { position: p });
    }

    let frames = drain(&mut rx);
    assert_eq!(frames.len(), path.len());
    assert!(frames.iter().all(|f| f["type"] == "player_moved" && f["player_id"] == "alice"));
    assert_eq!(h.world.players.get("alice").unwrap().position, pos(7.0, 7.0, 7.0));
}

#[test]
fn unbound_move_broadcasts_without_player_id() {
    let mut h = Harness::new();
    let (watcher, mut watcher_rx) = h.open();
    h.connect(&watcher, "watcher");
    drain(&mut watcher_rx);
    let before = h.world.players.snapshot();

    let (stranger, _rx) = h.open();
    let outcome = h.send(&stranger, ClientMessage::Move { position: pos(1.0, 1.0, 1.0) });
    assert_eq!(outcome, Outcome::Broadcast { recipients: 1 });

    let frames = drain(&mut watcher_rx);
    assert_eq!(
        frames,
        [json!({"type": "player_moved", "position": {"x": 1.0, "y": 1.0, "z": 1.0}})]
    );
    assert_eq!(h.world.players.snapshot(), before);
}

#[test]
fn get_chunk_on_empty_store_is_all_solid() {
    let mut h = Harness::new();
    let (a, mut rx) = h.open();
    assert_eq!(
        h.send(&a, ClientMessage::GetChunk { position: Position::ORIGIN }),
        Outcome::Replied
    );

    let frames = drain(&mut rx);
    assert_eq!(types(&frames), ["chunk_data"]);
    let blocks = frames[0]["blocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 65_536);
    assert!(blocks.iter().all(|b| b == 1));
    assert_eq!(frames[0]["position"], json!({"x": 0.0, "y": 0.0, "z": 0.0}));
}

#[test]
fn get_chunk_is_idempotent() {
    let mut h = Harness::new();
    let (a, mut rx) = h.open();
    let at = pos(3.0, 4.0, 5.0);
    h.send(&a, ClientMessage::GetChunk { position: at });
    h.send(&a, ClientMessage::GetChunk { position: at });

    let frames = drain(&mut rx);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["blocks"], frames[1]["blocks"]);
    assert_eq!(h.world.chunks.chunk_count(), 1);
}

#[test]
fn place_then_destroy_round_trips_to_air() {
    let mut h = Harness::new();
    let (a, mut rx) = h.open();
    h.connect(&a, "alice");
    let at = pos(2.0, 3.0, 4.0);
    let index = h.world.chunks.index(&at).unwrap();
    h.send(&a, ClientMessage::GetChunk { position: at });
    drain(&mut rx);

    h.send(
        &a,
        ClientMessage::PlaceBlock {
            position: at,
            block_type: BlockType::new(5),
        },
    );
    h.send(&a, ClientMessage::DestroyBlock { position: at });
    let frames = drain(&mut rx);
    assert_eq!(
        frames,
        [
            json!({"type": "block_placed", "position": {"x": 2.0, "y": 3.0, "z": 4.0}, "block_type": 5}),
            json!({"type": "block_destroyed", "position": {"x": 2.0, "y": 3.0, "z": 4.0}}),
        ]
    );

    h.send(&a, ClientMessage::GetChunk { position: at });
    let frames = drain(&mut rx);
    assert_eq!(frames[0]["blocks"][index], 0);
    assert_eq!(frames[0]["blocks"][0], 1);
}

#[test]
fn edits_on_unrequested_chunks_are_dropped() {
    let mut h = Harness::new();
    let (a, mut rx) = h.open();
    h.connect(&a, "alice");
    drain(&mut rx);

    let at = pos(2.0, 3.0, 4.0);
    let outcome = h.send(
        &a,
        ClientMessage::PlaceBlock {
            position: at,
            block_type: BlockType::new(5),
        },
    );
    assert_eq!(outcome, Outcome::Dropped(ChunkError::Missing(h.world.chunks.key_for(&at))));
    let outcome = h.send(&a, ClientMessage::DestroyBlock { position: at });
    assert!(matches!(outcome, Outcome::Dropped(ChunkError::Missing(_))));

    assert!(drain(&mut rx).is_empty());
    assert_eq!(h.world.chunks.chunk_count(), 0);
}

#[test]
fn players_list_projects_login_and_position() {
    let mut h = Harness::new();
    let (a, mut rx_a) = h.open();
    let (b, _rx_b) = h.open();
    h.connect(&a, "alice");
    h.connect(&b, "bob");
    h.send(&b, ClientMessage::Move { position: pos(1.0, 2.0, 3.0) });
    drain(&mut rx_a);

    let (anon, mut rx) = h.open();
    h.send(&anon, ClientMessage::GetPlayers);
    let frames = drain(&mut rx);
    assert_eq!(types(&frames), ["players_list"]);
    let players = frames[0]["players"].as_array().unwrap();
    assert_eq!(players.len(), 2);
    assert_eq!(players[0]["player_id"], "alice");
    assert_eq!(players[1], json!({"player_id": "bob", "position": {"x": 1.0, "y": 2.0, "z": 3.0}}));
    assert!(players.iter().all(|p| p.get("password").is_none()));
    // The query is answered to the asker only.
    assert!(drain(&mut rx_a).is_empty());
}
