//! Framed task protocol used to reach the write engine over a local
//! socket: length-prefixed JSON payloads with a magic resync marker,
//! plus the task request/response wire types and a thin client helper.

pub mod client;
pub mod errors;
pub mod framing;
pub mod message;

pub use client::TaskClient;
pub use errors::{ProtocolError, ProtocolResult};
pub use framing::{encode_frame, FrameDecoder, FRAME_MAGIC, MAX_FRAME_SIZE};
pub use message::{ResponseError, Task, TaskRequest, TaskResponse};
