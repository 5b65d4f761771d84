//! Async WebSocket transport for the Reya v2 feed.
//!
//! This module is organized by concern:
//! - [`mux`] - Channel fan-out and subscription lifetime tracking
//! - [`connection`] - Connection lifecycle, reconnection, frame dispatch
//!
//! The write half of the active connection lives behind a shared
//! [`WsSender`]; outbound traffic is fire-and-forget and silently dropped
//! while no connection is open.

pub mod connection;
pub mod mux;

use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use tungstenite::Message;

use crate::Result;
use crate::models::OutgoingMessage;

/// Write half of a Reya WebSocket connection.
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of a Reya WebSocket connection.
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Establishes a WebSocket connection to the given URL.
///
/// # Errors
///
/// Returns a [`RillError`](crate::RillError) if the connection or TLS
/// handshake fails.
pub async fn connect(url: &str) -> Result<(WsWriter, WsReader)> {
    let (ws_stream, _) = connect_async(url).await?;
    info!("WebSocket handshake completed");

    Ok(ws_stream.split())
}

/// Connection lifecycle states, exposed for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Closed,
}

/// Shared view of the current [`ConnectionState`].
#[derive(Clone, Default)]
pub struct StatusHandle(Arc<RwLock<ConnectionState>>);

impl StatusHandle {
    /// Current connection state.
    #[must_use]
    pub fn get(&self) -> ConnectionState {
        *self.0.read()
    }

    pub(crate) fn set(&self, state: ConnectionState) {
        *self.0.write() = state;
    }
}

/// Fire-and-forget outbound frame sink.
///
/// The multiplexer emits subscribe/unsubscribe traffic through this seam so
/// it stays independent of connection state.
pub trait WireSink: Send + Sync + 'static {
    fn send(&self, msg: OutgoingMessage);
}

/// Shared handle over the write half of the active connection.
///
/// The connection manager installs a fresh writer on every successful open
/// and clears it on close, so a send while disconnected finds `None` and is
/// dropped rather than queued.
#[derive(Clone, Default)]
pub struct WsSender {
    writer: Arc<tokio::sync::Mutex<Option<WsWriter>>>,
}

impl WsSender {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn install(&self, writer: WsWriter) {
        *self.writer.lock().await = Some(writer);
    }

    pub(crate) async fn clear(&self) {
        *self.writer.lock().await = None;
    }

    /// Sends a message on the active connection, awaiting the transport.
    /// Silently dropped if no connection is open.
    pub async fn send_now(&self, msg: &OutgoingMessage) {
        let json = match serde_json::to_string(msg) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize outbound message: {e}");
                return;
            }
        };

        let mut guard = self.writer.lock().await;
        match guard.as_mut() {
            Some(writer) => {
                if let Err(e) = writer.send(Message::Text(json.into())).await {
                    debug!("outbound frame dropped, send failed: {e}");
                }
            }
            None => debug!("outbound frame dropped, connection not open"),
        }
    }
}

impl WireSink for WsSender {
    fn send(&self, msg: OutgoingMessage) {
        let sender = self.clone();
        tokio::spawn(async move {
            sender.send_now(&msg).await;
        });
    }
}
