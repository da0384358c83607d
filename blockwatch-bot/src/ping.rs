//! Minecraft Server List Ping over TCP.
//!
//! One exchange: handshake (next state = status), status request, and a single
//! JSON status response.

use std::time::Duration;

use async_trait::async_trait;
use blockwatch_core::{ProbeError, ServerKey, StatusProbe, StatusResult};
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::trace;

/// Protocol version sent in the handshake (1.17.1).
pub const DEFAULT_PROTOCOL_VERSION: i32 = 756;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Largest status frame we accept.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

#[derive(Deserialize)]
struct StatusResponse {
    players: Option<Players>,
}

#[derive(Deserialize)]
struct Players {
    max: u32,
    online: u32,
    #[serde(default)]
    sample: Option<Vec<SamplePlayer>>,
}

#[derive(Deserialize)]
struct SamplePlayer {
    name: String,
}

/// [`StatusProbe`] backed by the Server List Ping protocol.
#[derive(Debug, Clone)]
pub struct SlpProbe {
    pub timeout: Duration,
    pub protocol_version: i32,
}

impl SlpProbe {
    pub fn new(timeout: Duration, protocol_version: i32) -> Self {
        Self {
            timeout,
            protocol_version,
        }
    }
}

impl Default for SlpProbe {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_PROTOCOL_VERSION)
    }
}

#[async_trait]
impl StatusProbe for SlpProbe {
    async fn probe(&self, server: &ServerKey) -> Result<StatusResult, ProbeError> {
        ping(server, self.timeout, self.protocol_version).await
    }
}

/// Ping a server, failing with [`ProbeError::Timeout`] if the whole exchange takes longer than `timeout`.
pub async fn ping(
    server: &ServerKey,
    timeout: Duration,
    protocol_version: i32,
) -> Result<StatusResult, ProbeError> {
    tokio::time::timeout(timeout, exchange(server, protocol_version))
        .await
        .map_err(|_| ProbeError::Timeout(timeout))?
}

async fn exchange(server: &ServerKey, protocol_version: i32) -> Result<StatusResult, ProbeError> {
    let mut stream = TcpStream::connect((server.host(), server.port())).await?;

    let mut handshake = Vec::with_capacity(server.host().len() + 16);
    write_varint(&mut handshake, 0x00);
    write_varint(&mut handshake, protocol_version);
    write_string(&mut handshake, server.host());
    handshake.extend_from_slice(&server.port().to_be_bytes());
    write_varint(&mut handshake, 1);

    let mut request = Vec::new();
    write_packet(&mut request, &handshake);
    write_packet(&mut request, &[0x00]);
    stream.write_all(&request).await?;
    stream.flush().await?;

    let len = read_varint(&mut stream).await?;
    let len = usize::try_from(len)
        .ok()
        .filter(|len| *len <= MAX_FRAME_LEN)
        .ok_or_else(|| ProbeError::Malformed(format!("bad frame length {len}")))?;
    let mut frame = vec![0; len];
    stream.read_exact(&mut frame).await?;
    trace!(%server, len, "status frame received");

    let mut body = frame.as_slice();
    let packet_id = decode_varint(&mut body)?;
    if packet_id != 0x00 {
        return Err(ProbeError::Malformed(format!(
            "unexpected packet id {packet_id:#x}"
        )));
    }
    let json_len = usize::try_from(decode_varint(&mut body)?)
        .ok()
        .filter(|len| *len <= body.len())
        .ok_or_else(|| ProbeError::Malformed("truncated status string".to_string()))?;
    parse_status(&body[..json_len])
}

/// Extract the player section of a status JSON document.
pub fn parse_status(json: &[u8]) -> Result<StatusResult, ProbeError> {
    let response: StatusResponse =
        serde_json::from_slice(json).map_err(|e| ProbeError::Malformed(e.to_string()))?;
    let players = response.players.ok_or(ProbeError::EmptyResponse)?;
    Ok(StatusResult {
        online: players.online,
        max: players.max,
        sample: players
            .sample
            .unwrap_or_default()
            .into_iter()
            .map(|p| p.name)
            .collect(),
    })
}

pub fn write_varint(buf: &mut Vec<u8>, value: i32) {
    let mut value = value as u32;
    loop {
        if value & !0x7F == 0 {
            buf.push(value as u8);
            return;
        }
        buf.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    write_varint(buf, s.len() as i32);
    buf.extend_from_slice(s.as_bytes());
}

/// Length-prefix `payload` and append it to `buf`.
pub fn write_packet(buf: &mut Vec<u8>, payload: &[u8]) {
    write_varint(buf, payload.len() as i32);
    buf.extend_from_slice(payload);
}

/// Decode a VarInt from the front of `buf`, advancing it.
pub fn decode_varint(buf: &mut &[u8]) -> Result<i32, ProbeError> {
    let mut value: u32 = 0;
    for i in 0..5 {
        let bytes: &[u8] = *buf;
        let (&byte, rest) = bytes
            .split_first()
            .ok_or_else(|| ProbeError::Malformed("truncated varint".to_string()))?;
        *buf = rest;
        value |= u32::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(ProbeError::Malformed("varint too long".to_string()))
}

/// Read a VarInt from a stream.
pub async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> Result<i32, ProbeError> {
    let mut value: u32 = 0;
    for i in 0..5 {
        let byte = reader.read_u8().await?;
        value |= u32::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(ProbeError::Malformed("varint too long".to_string()))
}
