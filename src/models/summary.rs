//! Market summary channel models.

use rust_decimal::Decimal;
use serde::Deserialize;

/// An update from the `/v2/market/{symbol}/summary` channel.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub symbol: String,
    pub updated_at: i64,
    pub long_oi_qty: Decimal,
    pub short_oi_qty: Decimal,
    pub oi_qty: Decimal,
    /// Funding rate as a decimal fraction per funding period.
    pub funding_rate: Decimal,
    pub funding_rate_velocity: Option<Decimal>,
    #[serde(rename = "volume24h")]
    pub volume_24h: Decimal,
    /// 24h price change, absolute (not a percentage).
    #[serde(rename = "pxChange24h")]
    pub px_change_24h: Option<Decimal>,
    pub throttled_oracle_price: Option<Decimal>,
    pub throttled_pool_price: Option<Decimal>,
    pub prices_updated_at: Option<i64>,
}
