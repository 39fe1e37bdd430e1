//! Shared helpers for the server integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde_json::Value;
use tokio::sync::mpsc;
use voxsync_engine::PlayerRecord;
use voxsync_server::connection_registry::Frame;
use voxsync_server::persistence::{PersistenceGateway, StorageError};

/// In-memory gateway that can be told to fail, and whose saves can be held
/// back by locking [`MemoryGateway::hold`].
#[derive(Default)]
pub struct MemoryGateway {
    records: Mutex<BTreeMap<String, PlayerRecord>>,
    pub fail_saves: AtomicBool,
    pub saves: AtomicUsize,
    pub hold: tokio::sync::Mutex<()>,
}

impl MemoryGateway {
    pub fn with_records(records: impl IntoIterator<Item = PlayerRecord>) -> Self {
        let gw = Self::default();
        gw.records
            .lock()
            .unwrap()
            .extend(records.into_iter().map(|r| (r.login.clone(), r)));
        gw
    }

    pub fn stored(&self, login: &str) -> Option<PlayerRecord> {
        self.records.lock().unwrap().get(login).cloned()
    }
}

impl PersistenceGateway for MemoryGateway {
    async fn load(&self) -> Result<Vec<PlayerRecord>, StorageError> {
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }

    async fn save(&self, records: Vec<PlayerRecord>) -> Result<(), StorageError> {
        drop(self.hold.lock().await);
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("disk on fire").into());
        }
        let mut stored = self.records.lock().unwrap();
        for record in records {
            stored.insert(record.login.clone(), record);
        }
        Ok(())
    }
}

/// Every frame queued so far, parsed.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Frame>) -> Vec<Value> {
    let mut out = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        out.push(serde_json::from_str(&frame).expect("server sent invalid JSON"));
    }
    out
}

pub fn types(frames: &[Value]) -> Vec<&str> {
    frames
        .iter()
        .map(|f| f["type"].as_str().unwrap_or_default())
        .collect()
}
