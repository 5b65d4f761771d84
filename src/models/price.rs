//! Prices channel models.

use rust_decimal::Decimal;
use serde::Deserialize;

/// An update from the `/v2/prices/{symbol}` channel.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    pub symbol: String,
    pub oracle_price: Decimal,
    pub pool_price: Option<Decimal>,
    /// Millisecond timestamp of the price observation.
    pub updated_at: i64,
}
