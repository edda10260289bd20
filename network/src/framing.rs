use tracing::{debug, warn};

use crate::errors::{ProtocolError, ProtocolResult};

/// Marks the start of every frame; the decoder scans for it to resync
/// after stream corruption.
pub const FRAME_MAGIC: [u8; 4] = [0xd1, 0x9e, 0x5a, 0xc3];

pub const MAX_FRAME_SIZE: usize = 8 * 1024 * 1024; // 8 MiB

/// Encodes a frame: magic, compact-size payload length, UTF-8 JSON.
pub fn encode_frame(payload: &serde_json::Value) -> ProtocolResult<Vec<u8>> {
    let body = serde_json::to_vec(payload)?;
    if body.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(body.len()));
    }
    let mut frame = Vec::with_capacity(4 + 9 + body.len());
    frame.extend_from_slice(&FRAME_MAGIC);
    write_compact_size(&mut frame, body.len() as u64);
    frame.extend_from_slice(&body);
    Ok(frame)
}

fn write_compact_size(buf: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => buf.push(n as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&n.to_le_bytes());
        }
    }
}

/// `None` means more bytes are needed; otherwise the value and the
/// number of bytes it occupied.
fn read_compact_size(buf: &[u8]) -> Option<(u64, usize)> {
    let first = *buf.first()?;
    match first {
        0..=0xfc => Some((first as u64, 1)),
        0xfd => Some((u16::from_le_bytes(buf.get(1..3)?.try_into().ok()?) as u64, 3)),
        0xfe => Some((u32::from_le_bytes(buf.get(1..5)?.try_into().ok()?) as u64, 5)),
        0xff => Some((u64::from_le_bytes(buf.get(1..9)?.try_into().ok()?), 9)),
    }
}

fn find_magic(buf: &[u8]) -> Option<usize> {
    buf.windows(FRAME_MAGIC.len()).position(|w| w == FRAME_MAGIC)
}

/// Streaming frame accumulator.
///
/// Feed it whatever chunks the socket yields; it buffers partial
/// frames, resynchronizes on the magic marker, and drops (with a log
/// line) payloads that are not valid JSON. One decoder per connection.
#[derive(Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes a chunk and returns every complete payload it finished.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<serde_json::Value> {
        self.buf.extend_from_slice(chunk);
        let mut decoded = Vec::new();

        loop {
            match find_magic(&self.buf) {
                Some(0) => {}
                Some(pos) => {
                    debug!(discarded = pos, "discarding bytes before frame magic");
                    self.buf.drain(..pos);
                }
                None => {
                    // Keep a possible magic prefix at the tail, drop the rest.
                    if self.buf.len() >= FRAME_MAGIC.len() {
                        let keep_from = self.buf.len() - (FRAME_MAGIC.len() - 1);
                        self.buf.drain(..keep_from);
                    }
                    break;
                }
            }

            let after_magic = &self.buf[FRAME_MAGIC.len()..];
            let Some((len, len_bytes)) = read_compact_size(after_magic) else {
                break;
            };
            if len as usize > MAX_FRAME_SIZE {
                warn!(len, "oversized frame length; resynchronizing");
                self.buf.drain(..FRAME_MAGIC.len());
                continue;
            }
            let total = FRAME_MAGIC.len() + len_bytes + len as usize;
            if self.buf.len() < total {
                break;
            }

            let payload = &self.buf[FRAME_MAGIC.len() + len_bytes..total];
            match serde_json::from_slice(payload) {
                Ok(value) => decoded.push(value),
                Err(e) => warn!(error = %e, "dropping frame with undecodable payload"),
            }
            self.buf.drain(..total);
        }

        decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encode_decode_single_frame() {
        let payload = json!({"task": {"id": "1", "method": "sync"}, "priority": 5});
        let frame = encode_frame(&payload).unwrap();

        let mut decoder = FrameDecoder::new();
        let out = decoder.push(&frame);
        assert_eq!(out, vec![payload]);
    }

    #[test]
    fn reassembles_one_byte_chunks() {
        // Large enough to exercise the 0xfd compact-size form.
        let payload = json!({"data": "x".repeat(600)});
        let frame = encode_frame(&payload).unwrap();
        assert_eq!(frame[4], 0xfd);

        let mut decoder = FrameDecoder::new();
        let mut out = Vec::new();
        for byte in &frame {
            out.extend(decoder.push(std::slice::from_ref(byte)));
        }
        assert_eq!(out, vec![payload]);
    }

    #[test]
    fn reassembles_arbitrary_splits() {
        let payload = json!({"method": "importWalletAddresses", "params": [1, 2, 3]});
        let frame = encode_frame(&payload).unwrap();

        for split in 1..frame.len() {
            let mut decoder = FrameDecoder::new();
            let mut out = decoder.push(&frame[..split]);
            out.extend(decoder.push(&frame[split..]));
            assert_eq!(out, vec![payload.clone()], "failed at split {}", split);
        }
    }

    #[test]
    fn discards_noise_before_magic() {
        let payload = json!({"ok": true});
        let mut stream = b"garbage bytes".to_vec();
        stream.extend(encode_frame(&payload).unwrap());

        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(&stream), vec![payload]);
    }

    #[test]
    fn drops_invalid_json_and_continues() {
        let good = json!({"ok": 1});
        let mut bad_frame = Vec::new();
        bad_frame.extend_from_slice(&FRAME_MAGIC);
        bad_frame.push(3);
        bad_frame.extend_from_slice(b"{{{");

        let mut stream = bad_frame;
        stream.extend(encode_frame(&good).unwrap());

        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(&stream), vec![good]);
    }

    #[test]
    fn two_frames_in_one_chunk() {
        let a = json!({"seq": 1});
        let b = json!({"seq": 2});
        let mut stream = encode_frame(&a).unwrap();
        stream.extend(encode_frame(&b).unwrap());

        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(&stream), vec![a, b]);
    }

    #[test]
    fn waits_for_partial_payload() {
        let payload = json!({"wait": "for it"});
        let frame = encode_frame(&payload).unwrap();

        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(&frame[..frame.len() - 1]).is_empty());
        assert_eq!(decoder.push(&frame[frame.len() - 1..]), vec![payload]);
    }

    #[test]
    fn resyncs_after_oversized_length() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&FRAME_MAGIC);
        stream.push(0xff);
        stream.extend_from_slice(&u64::MAX.to_le_bytes());
        let good = json!({"ok": true});
        stream.extend(encode_frame(&good).unwrap());

        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(&stream), vec![good]);
    }
}
