//! Perp executions channel models.

use rust_decimal::Decimal;
use serde::Deserialize;

/// A single execution from the `/v2/market/{symbol}/perpExecutions` channel.
///
/// The feed may legitimately resend executions; `(timestamp,
/// sequence_number)` is a best-effort display identity, not a dedup key.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub exchange_id: i64,
    pub symbol: String,
    pub account_id: i64,
    pub qty: Decimal,
    pub side: Side,
    pub price: Decimal,
    pub fee: Decimal,
    #[serde(rename = "type")]
    pub exec_type: ExecutionType,
    /// Millisecond execution timestamp.
    pub timestamp: i64,
    /// Monotonically increasing sequence number within the market.
    pub sequence_number: i64,
}

/// Taker side of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Side {
    #[serde(rename = "B")]
    Buy,
    #[serde(rename = "A")]
    Sell,
}

impl Side {
    /// Human-readable side name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// How the execution came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionType {
    OrderMatch,
    Liquidation,
    Adl,
}
