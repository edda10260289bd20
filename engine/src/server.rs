use std::sync::Arc;

use network::{encode_frame, FrameDecoder, ProtocolResult, TaskRequest, TaskResponse};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, warn};

use crate::queue::TaskQueue;

/// Accepts framed task submissions on the local socket and funnels them
/// into the priority queue. Each connection gets its own decoder; a bad
/// frame only costs that frame, a bad connection only that connection.
pub struct TaskServer {
    queue: Arc<TaskQueue>,
}

impl TaskServer {
    pub fn new(queue: Arc<TaskQueue>) -> Self {
        Self { queue }
    }

    pub async fn run(&self, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!(%addr, "task connection opened");
                    let queue = self.queue.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, queue).await {
                            debug!(%addr, error = %e, "task connection closed");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "accept failed");
                }
            }
        }
    }
}

async fn handle_connection(mut stream: TcpStream, queue: Arc<TaskQueue>) -> ProtocolResult<()> {
    let mut decoder = FrameDecoder::new();
    let mut chunk = [0u8; 8192];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        for value in decoder.push(&chunk[..n]) {
            let request: TaskRequest = match serde_json::from_value(value) {
                Ok(request) => request,
                Err(e) => {
                    warn!(error = %e, "skipping malformed task request");
                    continue;
                }
            };
            let id = request.task.id.clone();
            let response = match queue.submit(request.task, request.priority) {
                Ok(receiver) => receiver
                    .await
                    .unwrap_or_else(|_| TaskResponse::err(id, "worker unavailable")),
                Err(e) => TaskResponse::err(id, e.to_string()),
            };
            stream.write_all(&encode_frame(&serde_json::to_value(&response)?)?).await?;
        }
    }
}
