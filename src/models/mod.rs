//! Shared models for Reya WebSocket v2 messages.
//!
//! Contains channel definitions, the inbound/outbound message envelopes,
//! and one module per channel payload shape.

pub mod candle;
pub mod depth;
pub mod execution;
pub mod price;
pub mod summary;

use serde::{Deserialize, Serialize};

/// Stream kinds multiplexed over the single Reya WebSocket connection.
///
/// A channel is addressed by its full path, which encodes both the stream
/// kind and the market symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Oracle/pool price ticks (wire path: `/v2/prices/{symbol}`).
    Prices,
    /// 24h market summary (wire path: `/v2/market/{symbol}/summary`).
    Summary,
    /// Leveled order book depth (wire path: `/v2/market/{symbol}/depth`).
    Depth,
    /// Perp execution stream (wire path: `/v2/market/{symbol}/perpExecutions`).
    PerpExecutions,
}

impl Channel {
    /// Returns the wire-format channel path for a market symbol.
    #[must_use]
    pub fn name(&self, symbol: &str) -> String {
        match self {
            Channel::Prices => format!("/v2/prices/{symbol}"),
            Channel::Summary => format!("/v2/market/{symbol}/summary"),
            Channel::Depth => format!("/v2/market/{symbol}/depth"),
            Channel::PerpExecutions => format!("/v2/market/{symbol}/perpExecutions"),
        }
    }
}

/// An outbound client → server message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutgoingMessage {
    Subscribe { channel: String },
    Unsubscribe { channel: String },
    /// Reply to a server ping, echoing the server's timestamp.
    Pong { timestamp: i64 },
}

/// An inbound server → client message envelope.
///
/// `channel_data` payloads stay raw here; each handler decodes the shape its
/// channel kind actually carries.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IncomingMessage {
    /// Liveness probe; must be answered with a pong immediately.
    Ping { timestamp: i64 },
    ChannelData(ChannelMessage),
    Subscribed { channel: String },
    Unsubscribed { channel: String },
    Error {
        message: String,
        #[serde(default)]
        channel: Option<String>,
    },
}

/// A data message tagged with the channel it belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelMessage {
    pub channel: String,
    pub timestamp: i64,
    pub data: serde_json::Value,
}
