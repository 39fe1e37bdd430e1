//! Player record persistence.
//!
//! The server talks to storage only through [`PersistenceGateway`]. Two
//! implementations ship here: [`NoPersistence`] for running purely in memory,
//! and [`JsonFileGateway`], one JSON array of records on disk.

use std::collections::BTreeMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use voxsync_engine::PlayerRecord;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where player records live between sessions.
pub trait PersistenceGateway: Send + Sync + 'static {
    /// Every stored record.
    fn load(&self) -> impl Future<Output = Result<Vec<PlayerRecord>, StorageError>> + Send;

    /// Store `records`, replacing stored records with the same login and
    /// keeping all others.
    fn save(
        &self,
        records: Vec<PlayerRecord>,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// The stored record for `login`, if any.
    fn find(
        &self,
        login: &str,
    ) -> impl Future<Output = Result<Option<PlayerRecord>, StorageError>> + Send {
        async move {
            let records = self.load().await?;
            Ok(records.into_iter().find(|r| r.login == login))
        }
    }
}

/// Storage that remembers nothing. Player data is lost on disconnect.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPersistence;

impl PersistenceGateway for NoPersistence {
    async fn load(&self) -> Result<Vec<PlayerRecord>, StorageError> {
        Ok(Vec::new())
    }

    async fn save(&self, _records: Vec<PlayerRecord>) -> Result<(), StorageError> {
        Ok(())
    }
}

/// All records in a single pretty-printed JSON array, sorted by login.
///
/// Writes go to a sibling `.tmp` file that is then renamed over the real one,
/// so a crash mid-save leaves the previous contents intact.
#[derive(Debug)]
pub struct JsonFileGateway {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<PlayerRecord>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl PersistenceGateway for JsonFileGateway {
    async fn load(&self) -> Result<Vec<PlayerRecord>, StorageError> {
        self.read_all().await
    }

    async fn save(&self, records: Vec<PlayerRecord>) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut merged: BTreeMap<String, PlayerRecord> = self
            .read_all()
            .await?
            .into_iter()
            .map(|r| (r.login.clone(), r))
            .collect();
        for record in records {
            merged.insert(record.login.clone(), record);
        }
        let data = serde_json::to_vec_pretty(&merged.into_values().collect::<Vec<_>>())?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Per-login async locks.
///
/// Whoever reads or writes a login's stored record holds that login's guard
/// for the whole read-modify-write, including the `.await` on storage. This
/// orders a disconnect save before a reconnect lookup of the same login.
#[derive(Debug, Default)]
pub struct SaveGuards {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SaveGuards {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, login: &str) -> OwnedMutexGuard<()> {
        let mutex = self.locks.entry(login.to_owned()).or_default().clone();
        mutex.lock_owned().await
    }

    /// Lock several logins at once. Locks are taken in sorted order so two
    /// callers can never deadlock on each other.
    pub async fn lock_all(&self, logins: &[String]) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted: Vec<&String> = logins.iter().collect();
        sorted.sort();
        sorted.dedup();
        let mut guards = Vec::with_capacity(sorted.len());
        for login in sorted {
            guards.push(self.lock(login).await);
        }
        guards
    }

    /// Forget locks nobody holds or waits on.
    pub fn prune(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
