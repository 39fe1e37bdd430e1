//! Lock-free operator counters.
//!
//! Connection tasks bump these with relaxed atomics and never block. The
//! dashboard reads them at its own pace.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::Instant;

pub struct Metrics {
    // Monotonic counters
    envelopes_received: AtomicU64,
    parse_errors: AtomicU64,
    unknown_types: AtomicU64,
    dropped_edits: AtomicU64,
    broadcasts: AtomicU64,
    frames_delivered: AtomicU64,
    saves_ok: AtomicU64,
    saves_failed: AtomicU64,

    // Gauges
    connections_open: AtomicU64,
    players_bound: AtomicU64,
    chunks_loaded: AtomicU64,

    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            envelopes_received: AtomicU64::new(0),
            parse_errors: AtomicU64::new(0),
            unknown_types: AtomicU64::new(0),
            dropped_edits: AtomicU64::new(0),
            broadcasts: AtomicU64::new(0),
            frames_delivered: AtomicU64::new(0),
            saves_ok: AtomicU64::new(0),
            saves_failed: AtomicU64::new(0),
            connections_open: AtomicU64::new(0),
            players_bound: AtomicU64::new(0),
            chunks_loaded: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn envelope_received(&self) {
        self.envelopes_received.fetch_add(1, Relaxed);
    }

    pub fn parse_error(&self) {
        self.parse_errors.fetch_add(1, Relaxed);
    }

    pub fn unknown_type(&self) {
        self.unknown_types.fetch_add(1, Relaxed);
    }

    pub fn edit_dropped(&self) {
        self.dropped_edits.fetch_add(1, Relaxed);
    }

    /// One envelope fanned out to `recipients` connections.
    pub fn broadcast(&self, recipients: usize) {
        self.broadcasts.fetch_add(1, Relaxed);
        self.frames_delivered.fetch_add(recipients as u64, Relaxed);
    }

    pub fn save_ok(&self) {
        self.saves_ok.fetch_add(1, Relaxed);
    }

    pub fn save_failed(&self) {
        self.saves_failed.fetch_add(1, Relaxed);
    }

    pub fn connection_opened(&self) {
        self.connections_open.fetch_add(1, Relaxed);
    }

    pub fn connection_closed(&self) {
        self.connections_open.fetch_sub(1, Relaxed);
    }

    /// Refresh the world gauges after a state change.
    pub fn set_world(&self, players: usize, chunks: usize) {
        self.players_bound.store(players as u64, Relaxed);
        self.chunks_loaded.store(chunks as u64, Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs_f64(),
            envelopes_received: self.envelopes_received.load(Relaxed),
            parse_errors: self.parse_errors.load(Relaxed),
            unknown_types: self.unknown_types.load(Relaxed),
            dropped_edits: self.dropped_edits.load(Relaxed),
            broadcasts: self.broadcasts.load(Relaxed),
            frames_delivered: self.frames_delivered.load(Relaxed),
            saves_ok: self.saves_ok.load(Relaxed),
            saves_failed: self.saves_failed.load(Relaxed),
            connections_open: self.connections_open.load(Relaxed),
            players_bound: self.players_bound.load(Relaxed),
            chunks_loaded: self.chunks_loaded.load(Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable snapshot of all metrics at a point in time.
/// Clients compute rates by diffing consecutive snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: f64,
    pub envelopes_received: u64,
    pub parse_errors: u64,
    pub unknown_types: u64,
    pub dropped_edits: u64,
    pub broadcasts: u64,
    pub frames_delivered: u64,
    pub saves_ok: u64,
    pub saves_failed: u64,
    pub connections_open: u64,
    pub players_bound: u64,
    pub chunks_loaded: u64,
}
