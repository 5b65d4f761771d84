//! Candle (OHLCV) models and timeframe bucketing.

use serde::{Deserialize, Serialize};

/// One OHLCV aggregate over a fixed time bucket.
///
/// `time` is the bucket start in epoch seconds, aligned to the timeframe
/// interval. The history endpoint carries no volume, so candles built from
/// live ticks and history pages both default it to 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Chart timeframes supported by the candle history endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    H1,
    D1,
}

impl Timeframe {
    /// Returns the wire-format resolution name expected by the Reya API.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::D1 => "1d",
        }
    }

    /// Bucket length in seconds.
    #[must_use]
    pub fn interval_seconds(&self) -> i64 {
        match self {
            Timeframe::M1 => 60,
            Timeframe::M5 => 300,
            Timeframe::M15 => 900,
            Timeframe::H1 => 3600,
            Timeframe::D1 => 86_400,
        }
    }

    /// Aligns a millisecond timestamp down to the start of its bucket,
    /// in epoch seconds.
    #[must_use]
    pub fn bucket_start(&self, timestamp_ms: i64) -> i64 {
        let seconds = timestamp_ms.div_euclid(1000);
        let interval = self.interval_seconds();
        seconds.div_euclid(interval) * interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_start_aligns_to_interval() {
        // 2024-01-15T10:30:45.123Z
        let ts_ms = 1_705_314_645_123;
        assert_eq!(Timeframe::M1.bucket_start(ts_ms), 1_705_314_600);
        assert_eq!(Timeframe::M5.bucket_start(ts_ms), 1_705_314_600);
        assert_eq!(Timeframe::H1.bucket_start(ts_ms), 1_705_312_800);
        assert_eq!(Timeframe::D1.bucket_start(ts_ms), 1_705_276_800);
    }

    #[test]
    fn bucket_start_is_idempotent_on_aligned_input() {
        let aligned = 1_705_314_600;
        assert_eq!(Timeframe::M1.bucket_start(aligned * 1000), aligned);
    }

    #[test]
    fn resolution_names_match_api() {
        assert_eq!(Timeframe::M1.as_str(), "1m");
        assert_eq!(Timeframe::M5.as_str(), "5m");
        assert_eq!(Timeframe::M15.as_str(), "15m");
        assert_eq!(Timeframe::H1.as_str(), "1h");
        assert_eq!(Timeframe::D1.as_str(), "1d");
    }
}
