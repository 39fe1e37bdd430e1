//! Connection lifecycle around the world state.
//!
//! `Server` is shared as `Arc<Server<G>>` by every socket task. In-memory
//! state sits behind one `std::sync::Mutex` that is only ever held inside
//! synchronous sections, so envelopes are applied one at a time. Storage
//! calls happen outside that lock and are ordered per login by
//! [`SaveGuards`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use voxsync_engine::{PlayerDirectory, PlayerRecord, WorldConfig};

use crate::connection_registry::{ConnIdAllocator, Connection, Frame};
use crate::dashboard::Metrics;
use crate::dispatch::{self, Outcome};
use crate::persistence::{PersistenceGateway, SaveGuards, StorageError};
use crate::protocol::{self, ClientMessage, Inbound, ServerMessage};
use crate::state::WorldState;

pub struct Server<G> {
    world: Mutex<WorldState>,
    gateway: G,
    guards: SaveGuards,
    metrics: Arc<Metrics>,
    ids: ConnIdAllocator,
}

impl<G: PersistenceGateway> Server<G> {
    /// Build a server and seed the directory from `gateway`. A failed load
    /// is logged and the server starts with no players.
    pub async fn start(gateway: G, config: WorldConfig) -> Self {
        let mut world = WorldState::new(config);
        match gateway.load().await {
            Ok(records) => {
                tracing::info!("Loaded {} player records", records.len());
                world.players = PlayerDirectory::from_records(records);
            }
            Err(e) => tracing::warn!("Failed to load player records, starting empty: {}", e),
        }

        let metrics = Arc::new(Metrics::new());
        metrics.set_world(world.players.len(), world.chunks.chunk_count());
        Self {
            world: Mutex::new(world),
            gateway,
            guards: SaveGuards::new(),
            metrics,
            ids: ConnIdAllocator::new(),
        }
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Read-only look at the world, for diagnostics and tests.
    pub fn inspect<T>(&self, f: impl FnOnce(&WorldState) -> T) -> T {
        f(&self.world())
    }

    fn world(&self) -> MutexGuard<'_, WorldState> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A new unauthenticated connection and the queue its writer drains.
    pub fn open_connection(&self) -> (Connection, mpsc::UnboundedReceiver<Frame>) {
        let (conn, rx) = Connection::channel(self.ids.allocate());
        self.metrics.connection_opened();
        tracing::debug!("Connection {} opened", conn.id());
        (conn, rx)
    }

    /// Handle one inbound text frame. Never fails: bad input is logged and
    /// dropped, the connection stays open.
    pub async fn handle_text(&self, conn: &Connection, raw: &str) {
        self.metrics.envelope_received();
        let msg = match protocol::decode(raw) {
            Ok(Inbound::Message(msg)) => msg,
            Ok(Inbound::Unknown(kind)) => {
                tracing::debug!("Ignoring unknown envelope type {:?} from {}", kind, conn.id());
                self.metrics.unknown_type();
                return;
            }
            Err(e) => {
                tracing::warn!("Malformed envelope from {}: {}", conn.id(), e);
                self.metrics.parse_error();
                return;
            }
        };

        if let ClientMessage::Connect { login, .. } = &msg {
            let _guard = self.guards.lock(login).await;
            self.reattach(login).await;
            self.apply(conn, msg);
        } else {
            self.apply(conn, msg);
        }
    }

    /// Pull a stored record back into the directory if this login is not
    /// already live. Caller holds the login's guard.
    async fn reattach(&self, login: &str) {
        let known = self.world().players.contains(login);
        if known {
            return;
        }
        match self.gateway.find(login).await {
            Ok(Some(record)) => {
                tracing::info!("Restored stored record for {}", login);
                self.world().players.restore(record);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to look up stored record for {}: {}", login, e),
        }
    }

    fn apply(&self, conn: &Connection, msg: ClientMessage) {
        let outcome = {
            let mut world = self.world();
            let outcome = dispatch::route(&mut world, conn, msg, &mut rand::thread_rng());
            self.metrics
                .set_world(world.players.len(), world.chunks.chunk_count());
            outcome
        };
        match outcome {
            Outcome::Replied => {}
            Outcome::Broadcast { recipients } => self.metrics.broadcast(recipients),
            Outcome::Dropped(_) => self.metrics.edit_dropped(),
        }
    }

    /// Tear down a connection: unbind it, persist its player if this was the
    /// login's last connection, and tell everyone it left. The departure is
    /// broadcast even for connections that never bound a login.
    pub async fn handle_close(&self, conn: &Connection) {
        self.metrics.connection_closed();
        let login = self.world().connections.unregister(conn.id());

        if let Some(login) = &login {
            let _guard = self.guards.lock(login).await;
            let record = {
                let mut world = self.world();
                // Another connection may have bound the same login meanwhile;
                // it keeps the live record and we only save a copy.
                if world.connections.count_login(login) == 0 {
                    world.players.remove(login)
                } else {
                    world.players.get(login).cloned()
                }
            };
            if let Some(record) = record {
                if self.persist(vec![record]).await.is_ok() {
                    tracing::info!("Player {} left, record saved", login);
                }
            }
        }
        self.guards.prune();

        let recipients = {
            let world = self.world();
            self.metrics
                .set_world(world.players.len(), world.chunks.chunk_count());
            world.bus().publish(&ServerMessage::PlayerDisconnected {
                player_id: login.as_deref(),
            })
        };
        self.metrics.broadcast(recipients);
        tracing::debug!("Connection {} closed", conn.id());
    }

    /// Persist every record in the directory. Used by autosave and on
    /// shutdown. Returns how many records were written.
    pub async fn flush_all(&self) -> Result<usize, StorageError> {
        let logins = self.world().players.logins();
        if logins.is_empty() {
            return Ok(0);
        }
        let guards = self.guards.lock_all(&logins).await;
        let records: Vec<PlayerRecord> = {
            let world = self.world();
            logins
                .iter()
                .filter_map(|login| world.players.get(login).cloned())
                .collect()
        };
        let count = records.len();
        let result = self.persist(records).await;
        drop(guards);
        self.guards.prune();
        result.map(|()| count)
    }

    /// Save and count the outcome. Failures are logged for the operator and
    /// never reach clients.
    async fn persist(&self, records: Vec<PlayerRecord>) -> Result<(), StorageError> {
        let count = records.len();
        match self.gateway.save(records).await {
            Ok(()) => {
                self.metrics.save_ok();
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to save {} player record(s): {}", count, e);
                self.metrics.save_failed();
                Err(e)
            }
        }
    }
}
