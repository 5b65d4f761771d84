//! Order book projection.
//!
//! The feed delivers self-consistent full depth per message, so every
//! update replaces the ladder wholesale; there is no incremental merge.

use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::models::depth::{DepthLevel, DepthUpdate};

/// Current ladder plus derived spread metrics. Cloned out as the snapshot.
#[derive(Debug, Clone, Default)]
pub struct BookState {
    /// Bids, best (highest) first.
    pub bids: Vec<DepthLevel>,
    /// Asks, best (lowest) first.
    pub asks: Vec<DepthLevel>,
    /// `best ask − best bid`; `None` when either side is empty.
    pub spread: Option<Decimal>,
    /// `spread / best ask × 100`; `None` when either side is empty.
    pub spread_percent: Option<Decimal>,
}

/// Fixed-depth bid/ask ladder for one market.
pub struct OrderBook {
    depth: usize,
    state: RwLock<BookState>,
}

impl OrderBook {
    /// Creates an empty book keeping `depth` levels per side.
    #[must_use]
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            state: RwLock::new(BookState::default()),
        }
    }

    /// Replaces both ladders from a depth message and recomputes spread.
    pub fn on_depth(&self, update: &DepthUpdate) {
        let mut bids = update.bids.clone();
        bids.truncate(self.depth);
        let mut asks = update.asks.clone();
        asks.truncate(self.depth);

        let (spread, spread_percent) = match (bids.first(), asks.first()) {
            (Some(best_bid), Some(best_ask)) => {
                let spread = best_ask.px - best_bid.px;
                let percent = spread
                    .checked_div(best_ask.px)
                    .map(|r| r * Decimal::ONE_HUNDRED);
                (Some(spread), percent)
            }
            _ => (None, None),
        };

        *self.state.write() = BookState {
            bids,
            asks,
            spread,
            spread_percent,
        };
    }

    /// Empties the ladder, e.g. on a symbol switch.
    pub fn clear(&self) {
        *self.state.write() = BookState::default();
    }

    /// Immutable copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> BookState {
        self.state.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::depth::DepthType;
    use rust_decimal_macros::dec;

    fn level(px: Decimal, qty: Decimal) -> DepthLevel {
        DepthLevel { px, qty }
    }

    fn update(bids: Vec<DepthLevel>, asks: Vec<DepthLevel>) -> DepthUpdate {
        DepthUpdate {
            symbol: "BTCRUSDPERP".to_string(),
            depth_type: DepthType::Update,
            bids,
            asks,
            updated_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn computes_spread_and_percent() {
        let book = OrderBook::new(15);
        book.on_depth(&update(
            vec![level(dec!(100), dec!(1)), level(dec!(99), dec!(2))],
            vec![level(dec!(101), dec!(1)), level(dec!(102), dec!(1))],
        ));

        let snap = book.snapshot();
        assert_eq!(snap.spread, Some(dec!(1)));
        let percent = snap.spread_percent.unwrap();
        assert_eq!(percent.round_dp(4), dec!(0.9901));
    }

    #[test]
    fn empty_ask_side_yields_null_spread() {
        let book = OrderBook::new(15);
        book.on_depth(&update(vec![level(dec!(100), dec!(1))], vec![]));

        let snap = book.snapshot();
        assert_eq!(snap.bids.len(), 1);
        assert!(snap.asks.is_empty());
        assert_eq!(snap.spread, None);
        assert_eq!(snap.spread_percent, None);
    }

    #[test]
    fn ladders_truncate_to_configured_depth() {
        let book = OrderBook::new(2);
        let bids = (0..5)
            .map(|i| level(Decimal::from(100 - i), dec!(1)))
            .collect();
        let asks = (0..5)
            .map(|i| level(Decimal::from(101 + i), dec!(1)))
            .collect();
        book.on_depth(&update(bids, asks));

        let snap = book.snapshot();
        assert_eq!(snap.bids.len(), 2);
        assert_eq!(snap.asks.len(), 2);
        // Truncation keeps the best levels.
        assert_eq!(snap.bids[0].px, dec!(100));
        assert_eq!(snap.asks[0].px, dec!(101));
    }

    #[test]
    fn each_update_replaces_the_ladder_wholesale() {
        let book = OrderBook::new(15);
        book.on_depth(&update(
            vec![level(dec!(100), dec!(1))],
            vec![level(dec!(101), dec!(1))],
        ));
        book.on_depth(&update(vec![level(dec!(90), dec!(5))], vec![]));

        let snap = book.snapshot();
        assert_eq!(snap.bids.len(), 1);
        assert_eq!(snap.bids[0].px, dec!(90));
        assert!(snap.asks.is_empty());
        assert_eq!(snap.spread, None);
    }

    #[test]
    fn clear_empties_everything() {
        let book = OrderBook::new(15);
        book.on_depth(&update(
            vec![level(dec!(100), dec!(1))],
            vec![level(dec!(101), dec!(1))],
        ));
        book.clear();

        let snap = book.snapshot();
        assert!(snap.bids.is_empty());
        assert!(snap.asks.is_empty());
        assert_eq!(snap.spread, None);
    }
}
