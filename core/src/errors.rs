use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Duplicate txid index position at height {height} index {block_index}")]
    DuplicatePosition { height: u32, block_index: u32 },

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
