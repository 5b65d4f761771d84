//! Candle aggregation.
//!
//! Reconciles three timelines into one bucket-keyed series: backward REST
//! pagination, live price ticks, and scope (symbol/timeframe) switches.
//! Fetches run as spawned tasks; a scope switch bumps an epoch counter and
//! any fetch result carrying a stale epoch is discarded, never merged.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::history::CandleFetcher;
use crate::models::candle::{Candle, Timeframe};

/// Time-ascending candle sequence plus paging flags. Cloned out as the
/// snapshot.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    /// Candles sorted ascending by bucket start.
    pub candles: Vec<Candle>,
    /// An initial or load-more fetch is in flight.
    pub is_loading: bool,
    /// Older pages may still exist upstream.
    pub has_more: bool,
}

struct AggregatorState {
    symbol: String,
    timeframe: Timeframe,
    /// Bucket start → candle. Unordered; sorted on snapshot.
    candles: HashMap<i64, Candle>,
    /// Scope generation. Fetch results from an older generation are stale.
    epoch: u64,
    loading: bool,
    has_more: bool,
}

/// Builds the candle series for the active (symbol, timeframe) scope.
pub struct CandleAggregator {
    fetcher: Arc<dyn CandleFetcher>,
    page_size: usize,
    state: RwLock<AggregatorState>,
}

impl CandleAggregator {
    /// Creates an aggregator with no active scope. Nothing is fetched until
    /// [`set_scope`](Self::set_scope) is called.
    #[must_use]
    pub fn new(fetcher: Arc<dyn CandleFetcher>, page_size: usize) -> Self {
        Self {
            fetcher,
            page_size,
            state: RwLock::new(AggregatorState {
                symbol: String::new(),
                timeframe: Timeframe::M1,
                candles: HashMap::new(),
                epoch: 0,
                loading: false,
                has_more: true,
            }),
        }
    }

    /// Switches to a new scope: clears all candle state, invalidates any
    /// outstanding fetch, and starts the initial history load.
    ///
    /// Must be called within a Tokio runtime.
    pub fn set_scope(self: &Arc<Self>, symbol: &str, timeframe: Timeframe) {
        let epoch = {
            let mut state = self.state.write();
            state.symbol = symbol.to_string();
            state.timeframe = timeframe;
            state.candles.clear();
            state.has_more = true;
            state.loading = true;
            state.epoch += 1;
            state.epoch
        };

        let this = Arc::clone(self);
        let symbol = symbol.to_string();
        tokio::spawn(async move {
            let page = this.fetcher.fetch(&symbol, timeframe, None).await;
            this.finish_fetch(epoch, page, false);
        });
    }

    /// Requests one page of older candles, ending just before the earliest
    /// known bucket. A no-op while a fetch is in flight, after history is
    /// exhausted, or before any candle is known.
    ///
    /// Must be called within a Tokio runtime.
    pub fn load_more(self: &Arc<Self>) {
        let (epoch, symbol, timeframe, end_time_ms) = {
            let mut state = self.state.write();
            if state.loading || !state.has_more {
                return;
            }
            let Some(earliest) = state.candles.keys().min().copied() else {
                return;
            };
            state.loading = true;
            (
                state.epoch,
                state.symbol.clone(),
                state.timeframe,
                earliest * 1000,
            )
        };

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let page = this
                .fetcher
                .fetch(&symbol, timeframe, Some(end_time_ms))
                .await;
            this.finish_fetch(epoch, page, true);
        });
    }

    /// Applies a fetched page if its scope is still current.
    fn finish_fetch(
        &self,
        epoch: u64,
        page: crate::Result<Vec<Candle>>,
        backfill: bool,
    ) {
        let mut state = self.state.write();
        if state.epoch != epoch {
            debug!("Discarding history page for a stale scope");
            return;
        }
        state.loading = false;

        let page = match page {
            Ok(page) => page,
            Err(e) => {
                // has_more stays unresolved so a later load_more can retry.
                warn!("Candle history fetch failed: {e}");
                return;
            }
        };

        if backfill && page.is_empty() {
            state.has_more = false;
            return;
        }

        let inserted = merge_page(&mut state.candles, &page);

        // A backfill page of pure duplicates means pagination has looped on
        // the oldest data the API has.
        if backfill && inserted == 0 {
            state.has_more = false;
        }
        if page.len() < self.page_size {
            state.has_more = false;
        }
    }

    /// Merges one page of historical candles into the current scope,
    /// insert-if-absent per bucket. A short page marks history exhausted.
    pub fn on_historical_page(&self, page: &[Candle]) {
        let mut state = self.state.write();
        merge_page(&mut state.candles, page);
        if page.len() < self.page_size {
            state.has_more = false;
        }
    }

    /// Applies a live price tick to its bucket: existing candles update
    /// high/low/close (open is immutable); an absent bucket becomes a new
    /// flat candle with zero volume.
    pub fn on_live_tick(&self, price: f64, timestamp_ms: i64) {
        let mut state = self.state.write();
        let bucket = state.timeframe.bucket_start(timestamp_ms);

        match state.candles.get_mut(&bucket) {
            Some(candle) => {
                candle.high = candle.high.max(price);
                candle.low = candle.low.min(price);
                candle.close = price;
            }
            None => {
                state.candles.insert(
                    bucket,
                    Candle {
                        time: bucket,
                        open: price,
                        high: price,
                        low: price,
                        close: price,
                        volume: 0.0,
                    },
                );
            }
        }
    }

    /// Immutable copy of the series, sorted ascending by bucket start.
    #[must_use]
    pub fn snapshot(&self) -> CandleSeries {
        let state = self.state.read();
        let mut candles: Vec<Candle> = state.candles.values().copied().collect();
        candles.sort_by_key(|c| c.time);

        CandleSeries {
            candles,
            is_loading: state.loading,
            has_more: state.has_more,
        }
    }
}

/// Insert-if-absent merge: live data for a bucket is never overwritten by
/// historical data arriving late. Returns how many candles were new.
fn merge_page(candles: &mut HashMap<i64, Candle>, page: &[Candle]) -> usize {
    let mut inserted = 0;
    for candle in page {
        if let std::collections::hash_map::Entry::Vacant(entry) = candles.entry(candle.time) {
            entry.insert(*candle);
            inserted += 1;
        }
    }
    inserted
}
