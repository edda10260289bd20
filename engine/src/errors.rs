use database::DbError;
use indexer_core::{BlockHash, CoreError, WalletId};
use rpc_client::RpcError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    Db(#[from] DbError),

    #[error("Node RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("sync or import in progress")]
    Busy,

    #[error("task queue full")]
    QueueFull,

    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletId),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Chain moved during import: expected tip {expected}, node reported {actual}")]
    ChainMoved { expected: BlockHash, actual: BlockHash },

    /// The task raced ahead of the currently known chain tip; the queue
    /// re-queues it once at a lower priority before giving up.
    #[error("Deferred: {0}")]
    Deferred(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
