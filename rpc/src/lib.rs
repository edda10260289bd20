//! Read-only RPC surface against the blockchain node, with failover
//! across a configured endpoint pool.

pub mod api;
pub mod failover;
pub mod http;
pub mod model;

pub use api::NodeApi;
pub use failover::FailoverPool;
pub use http::HttpNodeClient;
pub use model::{AddressDeltaResponse, AddressHistoryDelta, AddressUtxo, AddressUtxoResponse, RpcError};
