//! Per-market state projections built from the feed.
//!
//! Each projection owns its state behind its own lock, is mutated only from
//! the dispatch turn (or a scope-change command), and exposes an immutable
//! snapshot for rendering:
//! - [`candles`] - OHLCV aggregation of history pages plus live ticks
//! - [`book`] - fixed-depth bid/ask ladder with spread metrics
//! - [`tape`] - bounded newest-first execution buffer
//! - [`ticker`] - 24h market summary header fields

pub mod book;
pub mod candles;
pub mod tape;
pub mod ticker;
