//! 24h market ticker projection.
//!
//! Header-level state assembled from the prices and summary channels.

use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::models::price::PriceUpdate;
use crate::models::summary::MarketSummary;

/// Latest header fields for one market. Cloned out as the snapshot.
#[derive(Debug, Clone, Default)]
pub struct TickerState {
    pub last_price: Option<Decimal>,
    pub oracle_price: Option<Decimal>,
    pub pool_price: Option<Decimal>,
    /// 24h price change, absolute (the feed does not send a percentage).
    pub px_change_24h: Option<Decimal>,
    pub volume_24h: Option<Decimal>,
    pub long_oi_qty: Option<Decimal>,
    pub short_oi_qty: Option<Decimal>,
    /// Funding rate as a decimal fraction per funding period.
    pub funding_rate: Option<Decimal>,
    pub updated_at: Option<i64>,
}

impl TickerState {
    /// Funding rate scaled for percent display. The single place the ×100
    /// conversion happens.
    #[must_use]
    pub fn funding_rate_percent(&self) -> Option<Decimal> {
        self.funding_rate.map(|rate| rate * Decimal::ONE_HUNDRED)
    }
}

/// Market ticker fed by the prices and summary channels.
#[derive(Default)]
pub struct MarketTicker {
    state: RwLock<TickerState>,
}

impl MarketTicker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a price tick.
    pub fn on_price(&self, update: &PriceUpdate) {
        let mut state = self.state.write();
        state.last_price = Some(update.oracle_price);
        state.oracle_price = Some(update.oracle_price);
        state.pool_price = update.pool_price;
        state.updated_at = Some(update.updated_at);
    }

    /// Applies a 24h summary update.
    pub fn on_summary(&self, summary: &MarketSummary) {
        let mut state = self.state.write();
        state.px_change_24h = summary.px_change_24h;
        state.volume_24h = Some(summary.volume_24h);
        state.long_oi_qty = Some(summary.long_oi_qty);
        state.short_oi_qty = Some(summary.short_oi_qty);
        state.funding_rate = Some(summary.funding_rate);
    }

    /// Empties the ticker, e.g. on a symbol switch.
    pub fn clear(&self) {
        *self.state.write() = TickerState::default();
    }

    /// Immutable copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> TickerState {
        self.state.read().clone()
    }
}
