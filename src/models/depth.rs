//! Order book depth channel models.

use rust_decimal::Decimal;
use serde::Deserialize;

/// An update from the `/v2/market/{symbol}/depth` channel.
///
/// Every message carries the full ladder for both sides; the projection
/// replaces its state wholesale rather than merging.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthUpdate {
    pub symbol: String,
    #[serde(rename = "type")]
    pub depth_type: DepthType,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
    pub updated_at: i64,
}

/// Whether the feed labeled this message a snapshot or an update. Both carry
/// self-consistent full depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepthType {
    Snapshot,
    Update,
}

/// A single price level in the order book.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DepthLevel {
    pub px: Decimal,
    pub qty: Decimal,
}
