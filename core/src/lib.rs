//! haven-core: session persistence for a life-simulation game.
//!
//! Two halves:
//!   - `slot_store`: aggregates gameplay state from providers into one
//!     snapshot file per slot, with autosave and legacy-format migration.
//!   - `pickup`: the per-scene registry of world pickups, persisted as a
//!     blob in the preference store and respawned as scenes load.
//!
//! `session::GameSession` owns both and is driven by the host's tick and
//! scene events. `collab` holds in-memory providers for headless use.

pub mod clock;
pub mod codec;
pub mod collab;
pub mod config;
pub mod drops;
pub mod error;
pub mod event;
pub mod fsio;
pub mod migrate;
pub mod pickup;
pub mod prefs;
pub mod provider;
pub mod rng;
pub mod session;
pub mod slot_store;
pub mod snapshot;
pub mod types;
