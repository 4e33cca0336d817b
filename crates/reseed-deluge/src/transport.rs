//! Message framing.
//!
//! Each message is a version byte, a big-endian `u32` body length, and a
//! zlib-compressed rencode body.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{DelugeError, DelugeResult};
use crate::rencode::Value;

/// Protocol version byte spoken by Deluge 2 daemons.
pub const PROTOCOL_VERSION: u8 = 1;

/// Largest compressed or inflated body accepted.
pub const MAX_BODY_LEN: usize = 64 * 1024 * 1024;

/// Encode, compress and frame `value`.
///
/// # Errors
///
/// Returns [`DelugeError::Compression`] or [`DelugeError::FrameTooLarge`].
pub fn encode_frame(value: &Value) -> DelugeResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&value.to_bytes())
        .map_err(|source| DelugeError::Compression { source })?;
    let body = encoder
        .finish()
        .map_err(|source| DelugeError::Compression { source })?;
    let length = u32::try_from(body.len())
        .ok()
        .filter(|len| *len as usize <= MAX_BODY_LEN)
        .ok_or(DelugeError::FrameTooLarge { length: body.len() })?;

    let mut frame = Vec::with_capacity(5 + body.len());
    frame.push(PROTOCOL_VERSION);
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Inflate and decode a frame body.
///
/// # Errors
///
/// Returns [`DelugeError::Compression`], [`DelugeError::FrameTooLarge`] or
/// [`DelugeError::Decode`].
pub fn decode_body(body: &[u8]) -> DelugeResult<Value> {
    let limit = MAX_BODY_LEN as u64 + 1;
    let mut inflated = Vec::new();
    ZlibDecoder::new(body)
        .take(limit)
        .read_to_end(&mut inflated)
        .map_err(|source| DelugeError::Compression { source })?;
    if inflated.len() > MAX_BODY_LEN {
        return Err(DelugeError::FrameTooLarge {
            length: inflated.len(),
        });
    }
    Value::from_bytes(&inflated).map_err(|source| DelugeError::Decode { source })
}

/// Write one framed message.
///
/// # Errors
///
/// Returns a [`DelugeError`] when encoding or the write fails.
pub async fn write_message<W>(writer: &mut W, value: &Value) -> DelugeResult<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(value)?;
    writer
        .write_all(&frame)
        .await
        .map_err(|source| DelugeError::Io {
            operation: "write frame",
            source,
        })?;
    writer.flush().await.map_err(|source| DelugeError::Io {
        operation: "flush frame",
        source,
    })
}

/// Read one framed message.
///
/// # Errors
///
/// Returns a [`DelugeError`] when the stream ends, the header is invalid, or
/// the body cannot be decoded.
pub async fn read_message<R>(reader: &mut R) -> DelugeResult<Value>
where
    R: AsyncRead + Unpin,
{
    let version = reader.read_u8().await.map_err(|source| DelugeError::Io {
        operation: "read frame header",
        source,
    })?;
    if version != PROTOCOL_VERSION {
        return Err(DelugeError::UnsupportedProtocol { version });
    }
    let length = reader.read_u32().await.map_err(|source| DelugeError::Io {
        operation: "read frame header",
        source,
    })? as usize;
    if length > MAX_BODY_LEN {
        return Err(DelugeError::FrameTooLarge { length });
    }

    let mut body = vec![0_u8; length];
    reader
        .read_exact(&mut body)
        .await
        .map_err(|source| DelugeError::Io {
            operation: "read frame body",
            source,
        })?;
    decode_body(&body)
}
