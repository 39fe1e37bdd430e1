//! WebSocket front end and session engine for the voxsync world server.
//!
//! Clients exchange JSON envelopes ([`protocol`]) over a socket. The
//! [`server::Server`] applies them to a [`state::WorldState`] through
//! [`dispatch`], fans results out with [`event_bus`], and persists players
//! through a [`persistence::PersistenceGateway`].

pub mod config;
pub mod connection_registry;
pub mod dashboard;
pub mod dispatch;
pub mod event_bus;
pub mod net;
pub mod persistence;
pub mod protocol;
pub mod server;
pub mod state;

pub use server::Server;
