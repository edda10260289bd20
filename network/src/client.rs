use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::errors::{ProtocolError, ProtocolResult};
use crate::framing::{encode_frame, FrameDecoder};
use crate::message::{TaskRequest, TaskResponse};

/// Thin one-shot helper for submitting a task to the engine socket and
/// waiting for its response.
pub struct TaskClient {
    addr: String,
}

impl TaskClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub async fn submit(&self, request: &TaskRequest) -> ProtocolResult<TaskResponse> {
        let mut stream = TcpStream::connect(&self.addr).await?;
        stream.write_all(&encode_frame(&serde_json::to_value(request)?)?).await?;

        let mut decoder = FrameDecoder::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(ProtocolError::ConnectionClosed);
            }
            for value in decoder.push(&chunk[..n]) {
                match serde_json::from_value::<TaskResponse>(value) {
                    Ok(response) if response.id == request.task.id => return Ok(response),
                    Ok(response) => debug!(id = %response.id, "ignoring response for another task"),
                    Err(e) => debug!(error = %e, "ignoring undecodable response"),
                }
            }
        }
    }
}
