//! Authoritative directory of player records, keyed by login.
//!
//! The directory is the single owner of every [`PlayerRecord`]. Anything sent
//! to clients or handed to storage is a copy.

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};

use crate::world::position::{Position, Rotation};

/// Everything the server remembers about one player.
///
/// The password is kept in plain text exactly as received; it is stored and
/// persisted but never checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub login: String,
    pub password: String,
    pub position: Position,
    #[serde(default)]
    pub rotation: Rotation,
}

impl PlayerRecord {
    pub fn new(login: impl Into<String>, password: impl Into<String>, position: Position) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            position,
            rotation: Rotation::default(),
        }
    }
}

/// Result of [`PlayerDirectory::get_or_create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attach {
    /// A record with this login was already present and is returned as is.
    Existing,
    /// A new record was created at the spawn position.
    Created,
}

/// Insertion-ordered table of player records. Snapshots list players in the
/// order they were first added.
#[derive(Debug, Default)]
pub struct PlayerDirectory {
    players: IndexMap<String, PlayerRecord>,
}

impl PlayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the directory from storage. Later duplicates of a login win.
    pub fn from_records(records: impl IntoIterator<Item = PlayerRecord>) -> Self {
        let players = records
            .into_iter()
            .map(|record| (record.login.clone(), record))
            .collect();
        Self { players }
    }

    /// Return the record for `login`, creating it at `spawn` with zero
    /// rotation if absent. An existing record is returned unchanged, whatever
    /// `password` says.
    pub fn get_or_create(
        &mut self,
        login: &str,
        password: &str,
        spawn: Position,
    ) -> (&PlayerRecord, Attach) {
        match self.players.entry(login.to_owned()) {
            Entry::Occupied(entry) => (&*entry.into_mut(), Attach::Existing),
            Entry::Vacant(entry) => (
                &*entry.insert(PlayerRecord::new(login, password, spawn)),
                Attach::Created,
            ),
        }
    }

    /// Put back a record loaded from storage. A record already in the
    /// directory takes precedence; returns whether `record` was inserted.
    pub fn restore(&mut self, record: PlayerRecord) -> bool {
        if self.players.contains_key(&record.login) {
            return false;
        }
        self.players.insert(record.login.clone(), record);
        true
    }

    /// Last write wins. Unknown logins are ignored.
    pub fn update_position(&mut self, login: &str, position: Position) {
        if let Some(record) = self.players.get_mut(login) {
            record.position = position;
        }
    }

    /// Detach a record, typically to hand it to storage.
    pub fn remove(&mut self, login: &str) -> Option<PlayerRecord> {
        self.players.shift_remove(login)
    }

    pub fn get(&self, login: &str) -> Option<&PlayerRecord> {
        self.players.get(login)
    }

    pub fn contains(&self, login: &str) -> bool {
        self.players.contains_key(login)
    }

    pub fn logins(&self) -> Vec<String> {
        self.players.keys().cloned().collect()
    }

    /// Copies of every record, in join order.
    pub fn snapshot(&self) -> Vec<PlayerRecord> {
        self.players.values().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
