//! Feed facade.
//!
//! [`MarketFeed`] wires the connection manager, the channel multiplexer,
//! and the per-market projections into one queryable engine. It owns scope
//! switching: handlers for the old symbol are removed before projections
//! are cleared, and the new channels are registered only afterwards, so a
//! reader never observes old-symbol data after a switch.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rust_decimal::prelude::ToPrimitive;
use tokio::sync::mpsc;
use tracing::info;

use crate::config::{FeedSettings, ReyaConfig};
use crate::history::CandleFetcher;
use crate::market::book::{BookState, OrderBook};
use crate::market::candles::{CandleAggregator, CandleSeries};
use crate::market::tape::TradeTape;
use crate::market::ticker::{MarketTicker, TickerState};
use crate::models::Channel;
use crate::models::candle::Timeframe;
use crate::models::depth::DepthUpdate;
use crate::models::execution::Execution;
use crate::models::price::PriceUpdate;
use crate::models::summary::MarketSummary;
use crate::websocket::connection::{ConnectionCommand, ConnectionManager};
use crate::websocket::mux::{Handler, Multiplexer, Registration};
use crate::websocket::{ConnectionState, StatusHandle, WireSink, WsSender};

struct Scope {
    symbol: String,
    timeframe: Timeframe,
}

/// Live feed engine for one market at a time.
pub struct MarketFeed {
    mux: Arc<Multiplexer>,
    status: StatusHandle,
    decode_errors: Arc<AtomicU64>,
    candles: Arc<CandleAggregator>,
    book: Arc<OrderBook>,
    tape: Arc<TradeTape>,
    ticker: Arc<MarketTicker>,
    scope: Mutex<Option<Scope>>,
    registrations: Mutex<Vec<Registration>>,
    cmd_tx: mpsc::UnboundedSender<ConnectionCommand>,
}

impl MarketFeed {
    /// Builds the engine and spawns the connection lifecycle task.
    ///
    /// No channels are subscribed until [`set_scope`](Self::set_scope) is
    /// called. Must be called within a Tokio runtime.
    #[must_use]
    pub fn start(
        config: &ReyaConfig,
        settings: FeedSettings,
        fetcher: Arc<dyn CandleFetcher>,
    ) -> Self {
        let sender = WsSender::new();
        let mux = Arc::new(Multiplexer::new(
            Arc::new(sender.clone()) as Arc<dyn WireSink>
        ));
        let status = StatusHandle::default();
        let decode_errors = Arc::new(AtomicU64::new(0));
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let manager = ConnectionManager::new(
            config.websocket_url.clone(),
            &settings,
            Arc::clone(&mux),
            sender,
            status.clone(),
            Arc::clone(&decode_errors),
            cmd_rx,
        );
        tokio::spawn(manager.run());

        Self {
            mux,
            status,
            decode_errors,
            candles: Arc::new(CandleAggregator::new(fetcher, settings.history_page_size)),
            book: Arc::new(OrderBook::new(settings.book_depth)),
            tape: Arc::new(TradeTape::new(settings.tape_capacity)),
            ticker: Arc::new(MarketTicker::new()),
            scope: Mutex::new(None),
            registrations: Mutex::new(Vec::new()),
            cmd_tx,
        }
    }

    /// Switches every projection to a new (symbol, timeframe) scope.
    ///
    /// A symbol change re-points the channel subscriptions and clears the
    /// book, tape, and ticker; any change restarts the candle series and
    /// invalidates in-flight history fetches.
    pub fn set_scope(&self, symbol: &str, timeframe: Timeframe) {
        let (symbol_changed, timeframe_changed) = {
            let mut scope = self.scope.lock();
            let (symbol_changed, timeframe_changed) = match scope.as_ref() {
                Some(current) => (current.symbol != symbol, current.timeframe != timeframe),
                None => (true, true),
            };
            *scope = Some(Scope {
                symbol: symbol.to_string(),
                timeframe,
            });
            (symbol_changed, timeframe_changed)
        };

        if !symbol_changed && !timeframe_changed {
            return;
        }

        info!(symbol, timeframe = timeframe.as_str(), "Switching scope");

        if symbol_changed {
            // Remove old-symbol handlers first so nothing can repopulate
            // the projections once they are cleared.
            let old = std::mem::take(&mut *self.registrations.lock());
            for registration in old {
                self.mux.unregister(registration);
            }
            self.book.clear();
            self.tape.clear();
            self.ticker.clear();
        }

        self.candles.set_scope(symbol, timeframe);

        if symbol_changed {
            let registrations = vec![
                self.mux
                    .register(&Channel::Prices.name(symbol), self.price_handler()),
                self.mux
                    .register(&Channel::Summary.name(symbol), self.summary_handler()),
                self.mux
                    .register(&Channel::Depth.name(symbol), self.depth_handler()),
                self.mux.register(
                    &Channel::PerpExecutions.name(symbol),
                    self.executions_handler(),
                ),
            ];
            *self.registrations.lock() = registrations;
        }
    }

    /// Requests one page of older candles. Idempotent while a fetch is in
    /// flight or after history is exhausted.
    pub fn load_more(&self) {
        self.candles.load_more();
    }

    /// Stops the connection lifecycle. Terminal; later sends are dropped.
    pub fn stop(&self) {
        let _ = self.cmd_tx.send(ConnectionCommand::Shutdown);
    }

    /// Candle series snapshot, ascending by bucket start.
    #[must_use]
    pub fn candles(&self) -> CandleSeries {
        self.candles.snapshot()
    }

    /// Order book snapshot.
    #[must_use]
    pub fn order_book(&self) -> BookState {
        self.book.snapshot()
    }

    /// Trade tape snapshot, newest first.
    #[must_use]
    pub fn trades(&self) -> Vec<Execution> {
        self.tape.snapshot()
    }

    /// 24h ticker snapshot.
    #[must_use]
    pub fn ticker(&self) -> TickerState {
        self.ticker.snapshot()
    }

    /// Connection state, for display.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.status.get()
    }

    /// Malformed frames dropped since start.
    #[must_use]
    pub fn decode_errors(&self) -> u64 {
        self.decode_errors.load(Ordering::Relaxed)
    }

    fn price_handler(&self) -> Handler {
        let candles = Arc::clone(&self.candles);
        let ticker = Arc::clone(&self.ticker);
        Box::new(move |msg| {
            let update: PriceUpdate = serde_json::from_value(msg.data.clone())?;
            if let Some(price) = update.oracle_price.to_f64() {
                candles.on_live_tick(price, update.updated_at);
            }
            ticker.on_price(&update);
            Ok(())
        })
    }

    fn summary_handler(&self) -> Handler {
        let ticker = Arc::clone(&self.ticker);
        Box::new(move |msg| {
            let summary: MarketSummary = serde_json::from_value(msg.data.clone())?;
            ticker.on_summary(&summary);
            Ok(())
        })
    }

    fn depth_handler(&self) -> Handler {
        let book = Arc::clone(&self.book);
        Box::new(move |msg| {
            let update: DepthUpdate = serde_json::from_value(msg.data.clone())?;
            book.on_depth(&update);
            Ok(())
        })
    }

    fn executions_handler(&self) -> Handler {
        let tape = Arc::clone(&self.tape);
        Box::new(move |msg| {
            let batch: Vec<Execution> = serde_json::from_value(msg.data.clone())?;
            tape.on_executions(&batch);
            Ok(())
        })
    }
}
