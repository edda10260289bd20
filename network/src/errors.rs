use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Frame of {0} bytes exceeds maximum")]
    FrameTooLarge(usize),

    #[error("Connection closed before a response arrived")]
    ConnectionClosed,
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
