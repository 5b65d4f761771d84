//! WebSocket connection lifecycle management.
//!
//! [`ConnectionManager`] handles connecting, reading frames, automatic
//! reconnection with exponential backoff, and re-subscription to every
//! wanted channel after each reconnect. Inbound channel data is handed to
//! the [`Multiplexer`] synchronously, so all projections observe updates in
//! wire order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tungstenite::Message as WsMessage;

use super::mux::Multiplexer;
use super::{ConnectionState, StatusHandle, WsReader, WsSender, WsWriter, connect};
use crate::config::FeedSettings;
use crate::models::{IncomingMessage, OutgoingMessage};

/// Doubling past this exponent would overflow any sane base; the ceiling
/// applies long before.
const MAX_BACKOFF_EXP: u32 = 16;

/// Commands sent from the feed facade to the connection manager.
pub enum ConnectionCommand {
    /// Stop reconnecting and exit the lifecycle loop. Terminal.
    Shutdown,
}

/// Why the reader loop exited.
enum DisconnectReason {
    /// The connection was lost, errored, or closed by the server.
    ConnectionError,
    /// Shutdown was requested (or the command channel closed).
    Shutdown,
}

/// Reconnect delay policy: `min(base × 2^attempt, max)`.
///
/// The attempt counter resets on every successful open and increments on
/// every close, so an established connection that drops starts over at the
/// base delay.
pub(crate) struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    pub(crate) fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            attempt: 0,
        }
    }

    /// Delay to wait before the next attempt; advances the counter.
    pub(crate) fn next_delay(&mut self) -> Duration {
        let exp = self.attempt.min(MAX_BACKOFF_EXP);
        let delay = self.base.saturating_mul(1u32 << exp).min(self.max);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    pub(crate) fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Manages the WebSocket connection lifecycle including reconnection with
/// exponential backoff and post-reconnect subscription replay.
pub struct ConnectionManager {
    url: String,
    mux: Arc<Multiplexer>,
    sender: WsSender,
    status: StatusHandle,
    backoff: Backoff,
    decode_errors: Arc<AtomicU64>,
    cmd_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    #[must_use]
    pub fn new(
        url: String,
        settings: &FeedSettings,
        mux: Arc<Multiplexer>,
        sender: WsSender,
        status: StatusHandle,
        decode_errors: Arc<AtomicU64>,
        cmd_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
    ) -> Self {
        Self {
            url,
            mux,
            sender,
            status,
            backoff: Backoff::new(settings.reconnect_base, settings.reconnect_max),
            decode_errors,
            cmd_rx,
        }
    }

    /// Runs the connection manager loop until shutdown.
    ///
    /// Connects, replays wanted subscriptions, reads frames, and
    /// automatically reconnects with exponential backoff on disconnection.
    pub async fn run(mut self) {
        loop {
            self.status.set(ConnectionState::Connecting);
            info!(url = %self.url, "Connecting to feed");

            let (mut write, read) = match connect(&self.url).await {
                Ok(pair) => pair,
                Err(e) => {
                    error!("Connection failed: {e}");
                    self.status.set(ConnectionState::Closed);
                    if self.wait_backoff().await {
                        return;
                    }
                    continue;
                }
            };

            // Replay every wanted channel before handing the writer out, so
            // nothing can interleave with the resubscribe burst.
            for channel in self.mux.wanted() {
                let request = OutgoingMessage::Subscribe { channel };
                if let Err(e) = send_frame(&mut write, &request).await {
                    warn!("Resubscribe failed: {e}");
                }
            }

            self.sender.install(write).await;
            self.status.set(ConnectionState::Open);
            self.backoff.reset();
            info!("Feed connected and subscribed");

            let reason = self.read_loop(read).await;

            // Clear the writer so late sends are dropped, not stalled.
            self.sender.clear().await;
            self.status.set(ConnectionState::Closed);

            match reason {
                DisconnectReason::Shutdown => {
                    info!("Connection manager shutting down");
                    return;
                }
                DisconnectReason::ConnectionError => {
                    if self.wait_backoff().await {
                        return;
                    }
                }
            }
        }
    }

    /// Sleeps for the next backoff delay. Returns `true` if shutdown was
    /// requested while waiting.
    async fn wait_backoff(&mut self) -> bool {
        let delay = self.backoff.next_delay();
        info!(backoff_ms = delay.as_millis() as u64, "Backing off before retry");

        tokio::select! {
            () = tokio::time::sleep(delay) => false,
            cmd = self.cmd_rx.recv() => {
                matches!(cmd, Some(ConnectionCommand::Shutdown) | None)
            }
        }
    }

    /// Reads frames until disconnection or shutdown.
    async fn read_loop(&mut self, mut read: WsReader) -> DisconnectReason {
        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(WsMessage::Text(text))) => self.handle_frame(&text).await,
                        Some(Ok(WsMessage::Close(_))) => {
                            warn!("Server closed the connection");
                            return DisconnectReason::ConnectionError;
                        }
                        Some(Ok(_)) => {} // Binary/Ping/Pong frames
                        Some(Err(e)) => {
                            warn!("WebSocket error: {e}");
                            return DisconnectReason::ConnectionError;
                        }
                        None => {
                            warn!("WebSocket stream ended");
                            return DisconnectReason::ConnectionError;
                        }
                    }
                }

                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(ConnectionCommand::Shutdown) | None => {
                            return DisconnectReason::Shutdown;
                        }
                    }
                }
            }
        }
    }

    /// Decodes and routes one text frame. Malformed frames are counted and
    /// dropped; they never tear the connection down.
    async fn handle_frame(&self, text: &str) {
        let msg: IncomingMessage = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                self.decode_errors.fetch_add(1, Ordering::Relaxed);
                debug!("Dropping malformed frame: {e}");
                return;
            }
        };

        match msg {
            IncomingMessage::Ping { timestamp } => {
                // Answered before anything else touches the turn; the server
                // drops clients that reply late.
                self.sender
                    .send_now(&OutgoingMessage::Pong { timestamp })
                    .await;
            }
            IncomingMessage::ChannelData(data) => self.mux.dispatch(&data),
            IncomingMessage::Subscribed { channel } => {
                debug!(channel, "Subscription confirmed");
            }
            IncomingMessage::Unsubscribed { channel } => {
                debug!(channel, "Unsubscribed");
            }
            IncomingMessage::Error { message, channel } => {
                warn!(?channel, message, "Feed error");
            }
        }
    }
}

/// Serializes and sends one outbound message on a writer.
async fn send_frame(write: &mut WsWriter, msg: &OutgoingMessage) -> crate::Result<()> {
    let json = serde_json::to_string(msg)?;
    write.send(WsMessage::Text(json.into())).await?;

    Ok(())
}
