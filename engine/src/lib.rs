//! The wallet index write engine.
//!
//! Owns the on-disk index exclusively: applies blocks (and rolls them
//! back on reorg) transactionally, maintains the balance/txid/UTXO
//! projections, and serves prioritized write tasks from a single
//! serialized worker reachable over the framed socket protocol.

pub mod config;
pub mod engine;
pub mod errors;
pub mod guard;
pub mod import;
pub mod pruning;
pub mod queue;
pub mod recovery;
pub mod server;
pub mod sync;


pub use config::Config;
pub use engine::{Engine, Tip};
pub use errors::{EngineError, EngineResult};
pub use queue::{TaskMethod, TaskQueue, DEFER_PRIORITY};
pub use server::TaskServer;
pub use sync::SyncState;
