use crate::error::{RingError, Result};
use crate::protocol::message::RingMessage;
use rkyv::util::AlignedVec;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Bytes preceding every payload: `[payload_len: u64 LE]`.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Encode a `RingMessage` into a framed byte buffer: `[len][rkyv payload]`.
pub fn encode_message(msg: &RingMessage) -> Result<Vec<u8>> {
    let payload = rkyv::to_bytes::<rkyv::rancor::Error>(msg)
        .map_err(|e| RingError::EncodeFailed(e.to_string()))?;

    let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decode a framed byte buffer produced by [`encode_message`].
pub fn decode_message(buf: &[u8]) -> Result<RingMessage> {
    if buf.len() < FRAME_HEADER_SIZE {
        return Err(RingError::DecodeFailed(format!(
            "buffer too short: {} < {FRAME_HEADER_SIZE}",
            buf.len()
        )));
    }
    let len_bytes: [u8; FRAME_HEADER_SIZE] = buf[..FRAME_HEADER_SIZE]
        .try_into()
        .map_err(|_| RingError::DecodeFailed("header slice length mismatch".into()))?;
    let payload_len = u64::from_le_bytes(len_bytes) as usize;

    let payload_end = FRAME_HEADER_SIZE
        .checked_add(payload_len)
        .ok_or_else(|| RingError::DecodeFailed("payload length overflows".into()))?;
    if buf.len() < payload_end {
        return Err(RingError::DecodeFailed(format!(
            "buffer too short for payload: {} < {payload_end}",
            buf.len()
        )));
    }
    decode_payload(&buf[FRAME_HEADER_SIZE..payload_end])
}

/// Archived data must be aligned; network buffers are not.
fn decode_payload(payload: &[u8]) -> Result<RingMessage> {
    let mut aligned = AlignedVec::<16>::with_capacity(payload.len());
    aligned.extend_from_slice(payload);
    rkyv::from_bytes::<RingMessage, rkyv::rancor::Error>(&aligned)
        .map_err(|e| RingError::DecodeFailed(e.to_string()))
}

/// Write one frame and flush.
pub async fn write_message<W>(writer: &mut W, msg: &RingMessage) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_message(msg)?;
    writer
        .write_all(&frame)
        .await
        .map_err(|e| RingError::transport_with_source("frame write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| RingError::transport_with_source("frame flush", e))?;
    Ok(())
}

/// Read one frame. Returns `Ok(None)` when the stream ends cleanly between
/// frames.
pub async fn read_message<R>(reader: &mut R, max_frame_bytes: usize) -> Result<Option<RingMessage>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; FRAME_HEADER_SIZE];
    let mut filled = 0;
    while filled < FRAME_HEADER_SIZE {
        let n = reader
            .read(&mut len_buf[filled..])
            .await
            .map_err(|e| RingError::transport_with_source("frame read length", e))?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(RingError::DecodeFailed(format!(
                "stream closed inside frame header after {filled} of {FRAME_HEADER_SIZE} bytes"
            )));
        }
        filled += n;
    }

    let len = u64::from_le_bytes(len_buf) as usize;
    if len > max_frame_bytes {
        return Err(RingError::DecodeFailed(format!(
            "frame of {len} bytes exceeds limit of {max_frame_bytes}"
        )));
    }

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| RingError::transport_with_source("frame read payload", e))?;
    decode_payload(&payload).map(Some)
}
