//! Real-time market data feed engine for the Reya DEX.
//!
//! Maintains live, queryable projections of the Reya WebSocket v2 feed —
//! price candles, a leveled order book, a bounded trade tape, and a 24h
//! market ticker — reconciled with paginated REST candle history. The
//! [`feed::MarketFeed`] facade owns the connection lifecycle, channel
//! fan-out, and scope (symbol/timeframe) switching.

pub mod config;
pub mod error;
pub mod feed;
pub mod history;
pub mod market;
pub mod models;
pub mod websocket;

pub use error::{Result, RillError};
