//! Live connections and the login each one is bound to.
//!
//! A connection is only a handle to its socket's outbound queue; the socket
//! itself is owned by the task in [`crate::net::connection`]. The registry
//! holds bound connections only. A connection that never sent `connect` is
//! not in here and therefore receives no broadcasts.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use tokio::sync::mpsc;

/// One serialized envelope, shared between every recipient of a broadcast.
pub type Frame = Arc<str>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(pub u64);

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out connection ids. Ids are never reused within a process.
#[derive(Debug)]
pub struct ConnIdAllocator {
    next: AtomicU64,
}

impl ConnIdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn allocate(&self) -> ConnId {
        ConnId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Sending half of a connection. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnId,
    tx: mpsc::UnboundedSender<Frame>,
}

impl Connection {
    /// A fresh handle plus the receiver its socket writer drains.
    pub fn channel(id: ConnId) -> (Self, mpsc::UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, tx }, rx)
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    /// Open while the socket writer still holds the receiver.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Queue a frame. Returns `false` if the peer is already gone.
    pub fn send(&self, frame: Frame) -> bool {
        self.tx.send(frame).is_ok()
    }
}

/// Connection to login bindings, at most one per connection.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    bindings: IndexMap<ConnId, Binding>,
}

#[derive(Debug)]
struct Binding {
    conn: Connection,
    login: String,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `conn` to `login`, replacing any earlier binding of `conn`.
    pub fn register(&mut self, conn: &Connection, login: impl Into<String>) {
        self.bindings.insert(
            conn.id(),
            Binding {
                conn: conn.clone(),
                login: login.into(),
            },
        );
    }

    /// Drop the binding of `conn`, returning the login it had.
    pub fn unregister(&mut self, conn: ConnId) -> Option<String> {
        self.bindings.shift_remove(&conn).map(|b| b.login)
    }

    pub fn lookup(&self, conn: ConnId) -> Option<&str> {
        self.bindings.get(&conn).map(|b| b.login.as_str())
    }

    /// Every binding, for fan-out.
    pub fn all(&self) -> impl Iterator<Item = (&Connection, &str)> {
        self.bindings.values().map(|b| (&b.conn, b.login.as_str()))
    }

    /// How many live connections are bound to `login`.
    pub fn count_login(&self, login: &str) -> usize {
        self.bindings.values().filter(|b| b.login == login).count()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
