use bincode::config;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Serialize, de::DeserializeOwned};
use std::io::{self, Read, Write};

use super::errors::{self, SerializationError};

/// Width of the big-endian length prefix in front of every frame.
pub const PREFIX_LEN: usize = 4;

/// Maximum allowed message size (1MB) to prevent DoS attacks via unbounded allocation
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Serialize a value and prepend its length.
pub fn encode_frame<T: Serialize>(value: &T) -> errors::Result<Vec<u8>> {
    let serialized = encode_to_vec(value, config::standard())?;
    if serialized.len() > MAX_MESSAGE_SIZE {
        return Err(SerializationError::MessageTooLarge {
            actual: serialized.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    let size = serialized.len() as u32;
    let mut buf = Vec::with_capacity(PREFIX_LEN + serialized.len());
    buf.extend(size.to_be_bytes());
    buf.extend(serialized);
    Ok(buf)
}

fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> errors::Result<T> {
    let (value, _) = decode_from_slice(payload, config::standard())?;
    Ok(value)
}

fn check_len(len: usize) -> io::Result<()> {
    if len > MAX_MESSAGE_SIZE {
        return Err(SerializationError::MessageTooLarge {
            actual: len,
            max: MAX_MESSAGE_SIZE,
        }
        .into());
    }
    Ok(())
}

/// Fill `buf`, returning how many bytes were read before the peer closed.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }
    Ok(filled)
}

/// Block until one whole frame has arrived and decode it.
///
/// Returns `Ok(None)` if the peer closed the stream cleanly between frames.
/// A close partway through a frame is an `UnexpectedEof` error.
pub fn read_prefixed<T: DeserializeOwned, R: Read>(reader: &mut R) -> io::Result<Option<T>> {
    let mut len_bytes = [0; PREFIX_LEN];
    match read_full(reader, &mut len_bytes)? {
        0 => return Ok(None),
        PREFIX_LEN => {}
        _ => return Err(io::ErrorKind::UnexpectedEof.into()),
    }
    let len = u32::from_be_bytes(len_bytes) as usize;
    check_len(len)?;

    let mut buf = vec![0; len];
    if read_full(reader, &mut buf)? < len {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(Some(decode_payload(&buf)?))
}

pub fn write_prefixed<T: Serialize, W: Write>(writer: &mut W, value: &T) -> io::Result<()> {
    // Write the size of the serialized data and the serialized data
    // all in one chunk to prevent read-side EOF race conditions.
    let buf = encode_frame(value)?;
    writer.write_all(&buf)?;
    writer.flush()
}

/// Incremental frame decoder for non-blocking streams. Bytes are appended
/// as they arrive and whole frames are pulled out once complete.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes buffered towards a frame that hasn't finished arriving.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Pop the next complete frame, if any.
    ///
    /// An oversized length prefix is an `InvalidData` error and leaves the
    /// stream unusable. A payload that fails to decode is also an error, but
    /// the frame is consumed so the caller may carry on with the next one.
    pub fn next_frame<T: DeserializeOwned>(&mut self) -> io::Result<Option<T>> {
        if self.buf.len() < PREFIX_LEN {
            return Ok(None);
        }
        let mut len_bytes = [0; PREFIX_LEN];
        len_bytes.copy_from_slice(&self.buf[..PREFIX_LEN]);
        let len = u32::from_be_bytes(len_bytes) as usize;
        check_len(len)?;
        if self.buf.len() < PREFIX_LEN + len {
            return Ok(None);
        }
        let frame: Vec<u8> = self.buf.drain(..PREFIX_LEN + len).skip(PREFIX_LEN).collect();
        Ok(Some(decode_payload(&frame)?))
    }
}
