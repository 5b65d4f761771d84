//! Historical candle retrieval.
//!
//! The aggregator only sees the [`CandleFetcher`] trait: a paginated,
//! point-in-time fetch that returns up to one page of candles ascending by
//! time. [`RestCandleFetcher`] implements it over the Reya
//! `candleHistory` REST endpoint.

use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::Deserialize;
use tracing::debug;

use crate::models::candle::{Candle, Timeframe};
use crate::{Result, RillError};

/// Paginated candle source.
///
/// `end_time_ms` bounds the page from above; `None` means "most recent
/// page". Implementations return candles sorted ascending by bucket start.
pub trait CandleFetcher: Send + Sync {
    fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        end_time_ms: Option<i64>,
    ) -> BoxFuture<'static, Result<Vec<Candle>>>;
}

/// Candle history response: parallel arrays, OHLC as decimal strings. The
/// endpoint does not report volume.
#[derive(Debug, Deserialize)]
struct CandleHistoryResponse {
    #[serde(default)]
    t: Vec<i64>,
    #[serde(default)]
    o: Vec<String>,
    #[serde(default)]
    h: Vec<String>,
    #[serde(default)]
    l: Vec<String>,
    #[serde(default)]
    c: Vec<String>,
}

/// Fetches candle history from the Reya REST API.
pub struct RestCandleFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl RestCandleFetcher {
    /// Creates a fetcher against a REST base URL (e.g.
    /// `https://api.reya.xyz/v2`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl CandleFetcher for RestCandleFetcher {
    fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        end_time_ms: Option<i64>,
    ) -> BoxFuture<'static, Result<Vec<Candle>>> {
        let url = format!(
            "{}/candleHistory/{}/{}",
            self.base_url,
            symbol,
            timeframe.as_str()
        );
        let client = self.client.clone();

        async move {
            let end = end_time_ms.unwrap_or_else(now_ms);
            debug!(url = %url, end_time_ms = end, "Fetching candle history");

            let response = client
                .get(&url)
                .query(&[("endTime", end)])
                .send()
                .await?
                .error_for_status()?;

            let body: CandleHistoryResponse = response.json().await?;
            parse_history(&body)
        }
        .boxed()
    }
}

/// Maps the parallel arrays into candles, sorted ascending by time. The API
/// returns them descending.
fn parse_history(body: &CandleHistoryResponse) -> Result<Vec<Candle>> {
    let len = body.t.len();
    if body.o.len() != len || body.h.len() != len || body.l.len() != len || body.c.len() != len {
        return Err(RillError::Malformed(format!(
            "candle history arrays disagree on length: t={len}, o={}, h={}, l={}, c={}",
            body.o.len(),
            body.h.len(),
            body.l.len(),
            body.c.len()
        )));
    }

    let mut candles = Vec::with_capacity(len);
    for i in 0..len {
        candles.push(Candle {
            time: body.t[i],
            open: parse_price(&body.o[i])?,
            high: parse_price(&body.h[i])?,
            low: parse_price(&body.l[i])?,
            close: parse_price(&body.c[i])?,
            volume: 0.0,
        });
    }

    candles.sort_by_key(|c| c.time);

    Ok(candles)
}

fn parse_price(raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| RillError::Malformed(format!("unparseable price in candle history: {raw}")))
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_sorts_history_ascending() {
        let body: CandleHistoryResponse = serde_json::from_str(
            r#"{
                "t": [1705314720, 1705314600, 1705314660],
                "o": ["42100.5", "42000.0", "42050.25"],
                "h": ["42150.0", "42080.0", "42110.0"],
                "l": ["42090.0", "41990.0", "42040.0"],
                "c": ["42120.0", "42050.25", "42100.5"],
                "extra": "ignored"
            }"#,
        )
        .unwrap();

        let candles = parse_history(&body).unwrap();

        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].time, 1_705_314_600);
        assert_eq!(candles[1].time, 1_705_314_660);
        assert_eq!(candles[2].time, 1_705_314_720);
        assert_eq!(candles[0].open, 42000.0);
        assert_eq!(candles[0].close, 42050.25);
        assert_eq!(candles[0].volume, 0.0);
    }

    #[test]
    fn empty_response_yields_empty_page() {
        let body: CandleHistoryResponse = serde_json::from_str("{}").unwrap();
        assert!(parse_history(&body).unwrap().is_empty());
    }

    #[test]
    fn mismatched_arrays_are_malformed() {
        let body: CandleHistoryResponse = serde_json::from_str(
            r#"{"t": [1, 2], "o": ["1.0"], "h": ["1.0"], "l": ["1.0"], "c": ["1.0"]}"#,
        )
        .unwrap();

        assert!(matches!(
            parse_history(&body),
            Err(RillError::Malformed(_))
        ));
    }

    #[test]
    fn unparseable_price_is_malformed() {
        let body: CandleHistoryResponse = serde_json::from_str(
            r#"{"t": [1], "o": ["abc"], "h": ["1.0"], "l": ["1.0"], "c": ["1.0"]}"#,
        )
        .unwrap();

        assert!(matches!(parse_history(&body), Err(RillError::Malformed(_))));
    }
}
