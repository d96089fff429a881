//! Engine.IO v4 / socket.io v5 text frame codec.
//!
//! Only the subset a websocket-only client needs: no polling payload
//! batching and no binary attachments.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Default heartbeat window when the open packet omits it.
pub const DEFAULT_PING_INTERVAL_MS: u64 = 25_000;
pub const DEFAULT_PING_TIMEOUT_MS: u64 = 20_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,
    #[error("unknown packet type '{0}'")]
    UnknownType(char),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("unsupported packet: {0}")]
    Unsupported(String),
}

/// Payload of the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
}

fn default_ping_interval() -> u64 {
    DEFAULT_PING_INTERVAL_MS
}

fn default_ping_timeout() -> u64 {
    DEFAULT_PING_TIMEOUT_MS
}

impl Handshake {
    /// How long the server may stay silent before the session is considered dead.
    pub fn heartbeat_window_ms(&self) -> u64 {
        self.ping_interval.saturating_add(self.ping_timeout)
    }
}

/// socket.io packet carried inside an Engine.IO `message`.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect(Option<Value>),
    Disconnect,
    Event { name: String, data: Value },
    ConnectError(Value),
}

/// Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Message(SocketPacket),
    Upgrade,
    Noop,
}

pub fn decode(frame: &str) -> Result<EnginePacket, FrameError> {
    let mut chars = frame.chars();
    let kind = chars.next().ok_or(FrameError::Empty)?;
    let rest = chars.as_str();
    match kind {
        '0' => serde_json::from_str(rest)
            .map(EnginePacket::Open)
            .map_err(|e| FrameError::InvalidPayload(format!("open: {}", e))),
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping),
        '3' => Ok(EnginePacket::Pong),
        '4' => decode_socket(rest).map(EnginePacket::Message),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        other => Err(FrameError::UnknownType(other)),
    }
}

fn decode_socket(packet: &str) -> Result<SocketPacket, FrameError> {
    let mut chars = packet.chars();
    let kind = chars.next().ok_or(FrameError::Empty)?;
    let mut rest = chars.as_str();

    // Optional namespace: "/admin,"
    if rest.starts_with('/') {
        rest = match rest.split_once(',') {
            Some((_, tail)) => tail,
            None => "",
        };
    }
    // Optional ack id before the JSON payload.
    let payload = rest.trim_start_matches(|c: char| c.is_ascii_digit());

    match kind {
        '0' => {
            if payload.is_empty() {
                return Ok(SocketPacket::Connect(None));
            }
            parse_json(payload).map(|value| SocketPacket::Connect(Some(value)))
        }
        '1' => Ok(SocketPacket::Disconnect),
        '2' => {
            let Value::Array(mut items) = parse_json(payload)? else {
                return Err(FrameError::InvalidPayload(
                    "event payload is not an array".to_string(),
                ));
            };
            if items.is_empty() {
                return Err(FrameError::InvalidPayload("event without a name".to_string()));
            }
            let Value::String(name) = items.remove(0) else {
                return Err(FrameError::InvalidPayload(
                    "event name is not a string".to_string(),
                ));
            };
            let data = if items.is_empty() {
                Value::Null
            } else {
                items.remove(0)
            };
            Ok(SocketPacket::Event { name, data })
        }
        '3' => Err(FrameError::Unsupported("ack".to_string())),
        '4' => {
            let value = if payload.is_empty() {
                Value::Null
            } else {
                parse_json(payload)?
            };
            Ok(SocketPacket::ConnectError(value))
        }
        '5' | '6' => Err(FrameError::Unsupported("binary attachment".to_string())),
        other => Err(FrameError::UnknownType(other)),
    }
}

fn parse_json(payload: &str) -> Result<Value, FrameError> {
    serde_json::from_str(payload).map_err(|e| FrameError::InvalidPayload(e.to_string()))
}

/// Encodes a packet the client may send.
pub fn encode(packet: &EnginePacket) -> String {
    match packet {
        EnginePacket::Open(handshake) => format!(
            "0{}",
            serde_json::json!({
                "sid": handshake.sid,
                "pingInterval": handshake.ping_interval,
                "pingTimeout": handshake.ping_timeout,
            })
        ),
        EnginePacket::Close => "1".to_string(),
        EnginePacket::Ping => "2".to_string(),
        EnginePacket::Pong => "3".to_string(),
        EnginePacket::Message(socket) => format!("4{}", encode_socket(socket)),
        EnginePacket::Upgrade => "5".to_string(),
        EnginePacket::Noop => "6".to_string(),
    }
}

fn encode_socket(packet: &SocketPacket) -> String {
    match packet {
        SocketPacket::Connect(None) => "0".to_string(),
        SocketPacket::Connect(Some(auth)) => format!("0{}", auth),
        SocketPacket::Disconnect => "1".to_string(),
        SocketPacket::Event { name, data } => {
            let items = if data.is_null() {
                serde_json::json!([name])
            } else {
                serde_json::json!([name, data])
            };
            format!("2{}", items)
        }
        SocketPacket::ConnectError(value) => format!("4{}", value),
    }
}

/// The namespace connect frame, carrying the bearer token when there is one.
pub fn connect_frame(token: Option<&str>) -> String {
    let auth = token.map(|token| serde_json::json!({ "token": token }));
    encode(&EnginePacket::Message(SocketPacket::Connect(auth)))
}
