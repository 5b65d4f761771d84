//! Channel fan-out and subscription lifetime tracking.
//!
//! The [`Multiplexer`] owns the map from channel name to registered
//! handlers and the derived wanted-channel set. It emits subscribe and
//! unsubscribe wire messages exactly on the 0→1 and 1→0 handler-count
//! transitions; intermediate registrations on an already-wanted channel are
//! purely local.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::WireSink;
use crate::Result;
use crate::models::{ChannelMessage, OutgoingMessage};

/// A channel-data callback. Runs synchronously in the dispatch turn and must
/// not block; a returned error is logged and isolated from other handlers.
pub type Handler = Box<dyn FnMut(&ChannelMessage) -> Result<()> + Send>;

/// Removal capability returned by [`Multiplexer::register`].
///
/// Passing it back to [`Multiplexer::unregister`] removes exactly the
/// handler it was issued for.
#[must_use = "dropping a registration without unregistering leaks the handler"]
#[derive(Debug)]
pub struct Registration {
    channel: String,
    id: u64,
}

struct MuxState {
    /// Registration order is preserved per channel; dispatch follows it.
    handlers: HashMap<String, Vec<(u64, Handler)>>,
    next_id: u64,
}

/// Tracks wanted channels and fans inbound messages out to their handlers.
pub struct Multiplexer {
    sink: Arc<dyn WireSink>,
    state: Mutex<MuxState>,
}

impl Multiplexer {
    /// Creates a multiplexer that emits subscription traffic through `sink`.
    pub fn new(sink: Arc<dyn WireSink>) -> Self {
        Self {
            sink,
            state: Mutex::new(MuxState {
                handlers: HashMap::new(),
                next_id: 0,
            }),
        }
    }

    /// Adds a handler for a channel. Registrations are additive; the first
    /// one for a channel sends a subscribe on the wire.
    pub fn register(&self, channel: &str, handler: Handler) -> Registration {
        let (first, id) = {
            let mut state = self.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            let handlers = state.handlers.entry(channel.to_string()).or_default();
            let first = handlers.is_empty();
            handlers.push((id, handler));
            (first, id)
        };

        if first {
            debug!(channel, "channel wanted");
            self.sink.send(OutgoingMessage::Subscribe {
                channel: channel.to_string(),
            });
        }

        Registration {
            channel: channel.to_string(),
            id,
        }
    }

    /// Removes the handler behind `registration`. Removing the last handler
    /// for a channel sends an unsubscribe on the wire.
    pub fn unregister(&self, registration: Registration) {
        let emptied = {
            let mut state = self.state.lock();
            match state.handlers.get_mut(&registration.channel) {
                Some(handlers) => {
                    handlers.retain(|(id, _)| *id != registration.id);
                    if handlers.is_empty() {
                        state.handlers.remove(&registration.channel);
                        true
                    } else {
                        false
                    }
                }
                None => false,
            }
        };

        if emptied {
            debug!(channel = %registration.channel, "channel no longer wanted");
            self.sink.send(OutgoingMessage::Unsubscribe {
                channel: registration.channel,
            });
        }
    }

    /// The set of channels with at least one live handler, for subscription
    /// replay after a reconnect.
    #[must_use]
    pub fn wanted(&self) -> Vec<String> {
        self.state.lock().handlers.keys().cloned().collect()
    }

    /// Delivers a channel message to every handler registered for its
    /// channel, in registration order. A failing handler is logged and does
    /// not stop delivery to the rest.
    pub fn dispatch(&self, msg: &ChannelMessage) {
        let mut state = self.state.lock();
        let Some(handlers) = state.handlers.get_mut(&msg.channel) else {
            debug!(channel = %msg.channel, "no handler for channel, dropping");
            return;
        };

        for (id, handler) in handlers.iter_mut() {
            if let Err(e) = handler(msg) {
                warn!(channel = %msg.channel, handler = *id, "handler failed: {e}");
            }
        }
    }
}
