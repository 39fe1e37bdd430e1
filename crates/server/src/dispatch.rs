//! Routes decoded envelopes to the world state.
//!
//! A connection is either unauthenticated (no login bound) or bound by a
//! `connect`. Only `connect` changes that. Every handler runs to completion
//! on a `&mut WorldState` and never awaits; storage is the caller's business.

use rand::Rng;
use voxsync_engine::{Attach, BlockType, ChunkError, Position};

use crate::connection_registry::Connection;
use crate::event_bus;
use crate::protocol::{ClientMessage, PlayerSummary, ServerMessage};
use crate::state::WorldState;

/// What handling one envelope amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Only the sender was answered.
    Replied,
    /// An envelope went out to `recipients` connections.
    Broadcast { recipients: usize },
    /// A block edit was refused. Nothing was sent.
    Dropped(ChunkError),
}

pub fn route<R: Rng + ?Sized>(
    world: &mut WorldState,
    conn: &Connection,
    msg: ClientMessage,
    rng: &mut R,
) -> Outcome {
    tracing::debug!("{} -> {}", conn.id(), msg.kind());
    match msg {
        ClientMessage::Connect { login, password } => connect(world, conn, &login, &password, rng),
        ClientMessage::Move { position } => move_player(world, conn, position),
        ClientMessage::GetChunk { position } => get_chunk(world, conn, position),
        ClientMessage::PlaceBlock {
            position,
            block_type,
        } => edit_block(world, position, Edit::Place(block_type)),
        ClientMessage::DestroyBlock { position } => edit_block(world, position, Edit::Destroy),
        ClientMessage::GetPlayers => get_players(world, conn),
    }
}

fn connect<R: Rng + ?Sized>(
    world: &mut WorldState,
    conn: &Connection,
    login: &str,
    password: &str,
    rng: &mut R,
) -> Outcome {
    let spawn = world.chunks.random_surface_position(rng);
    let (record, attach) = world.players.get_or_create(login, password, spawn);
    let (position, rotation) = (record.position, record.rotation);
    world.connections.register(conn, login);

    let message = match attach {
        Attach::Existing => {
            tracing::info!("Player {} reattached on {}", login, conn.id());
            "Reconnected with stored data"
        }
        Attach::Created => {
            tracing::info!("New player {} joined on {} at {:?}", login, conn.id(), position);
            "Connection established"
        }
    };
    reply(
        conn,
        &ServerMessage::Connected {
            message,
            position,
            rotation,
        },
    );

    let recipients = world.bus().publish(&ServerMessage::PlayerConnected {
        player_id: login,
        position,
    });
    Outcome::Broadcast { recipients }
}

/// Unbound connections still produce a broadcast, just without a player id.
fn move_player(world: &mut WorldState, conn: &Connection, position: Position) -> Outcome {
    let login = world.connections.lookup(conn.id());
    if let Some(login) = login {
        world.players.update_position(login, position);
    }
    let recipients = world.bus().publish(&ServerMessage::PlayerMoved {
        player_id: login,
        position,
    });
    Outcome::Broadcast { recipients }
}

fn get_chunk(world: &mut WorldState, conn: &Connection, position: Position) -> Outcome {
    let key = world.chunks.key_for(&position);
    let chunk = world.chunks.get_or_create(key);
    reply(
        conn,
        &ServerMessage::ChunkData {
            position,
            blocks: chunk.blocks(),
        },
    );
    Outcome::Replied
}

#[derive(Clone, Copy)]
enum Edit {
    Place(BlockType),
    Destroy,
}

/// Edits on chunks nobody requested yet are dropped without telling the
/// client.
fn edit_block(world: &mut WorldState, position: Position, edit: Edit) -> Outcome {
    let block = match edit {
        Edit::Place(block) => block,
        Edit::Destroy => BlockType::AIR,
    };
    if let Err(e) = world.chunks.set_block_at(&position, block) {
        tracing::debug!("Dropped block edit at {:?}: {}", position, e);
        return Outcome::Dropped(e);
    }
    let message = match edit {
        Edit::Place(block_type) => ServerMessage::BlockPlaced {
            position,
            block_type,
        },
        Edit::Destroy => ServerMessage::BlockDestroyed { position },
    };
    let recipients = world.bus().publish(&message);
    Outcome::Broadcast { recipients }
}

fn get_players(world: &WorldState, conn: &Connection) -> Outcome {
    let players = world.players.iter().map(PlayerSummary::from).collect();
    reply(conn, &ServerMessage::PlayersList { players });
    Outcome::Replied
}

fn reply(conn: &Connection, message: &ServerMessage<'_>) {
    if let Some(frame) = event_bus::frame(message) {
        if !conn.send(frame) {
            tracing::debug!("Reply to {} dropped, peer gone", conn.id());
        }
    }
}
