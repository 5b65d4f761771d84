use std::sync::Arc;
use std::time::Duration;

use rill::RillError;
use rill::config::{DEFAULT_SYMBOL, FeedSettings, fetch_config};
use rill::feed::MarketFeed;
use rill::history::RestCandleFetcher;
use rill::models::candle::Timeframe;

#[tokio::main]
async fn main() -> Result<(), RillError> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt::init();

    let app_config = fetch_config()?;

    let fetcher = Arc::new(RestCandleFetcher::new(app_config.reya.rest_url.clone()));
    let feed = MarketFeed::start(&app_config.reya, FeedSettings::default(), fetcher);
    feed.set_scope(DEFAULT_SYMBOL, Timeframe::M1);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            () = tokio::time::sleep(Duration::from_secs(5)) => {
                let candles = feed.candles();
                let book = feed.order_book();
                let ticker = feed.ticker();
                tracing::info!(
                    status = ?feed.connection_state(),
                    candles = candles.candles.len(),
                    loading = candles.is_loading,
                    last_price = ?ticker.last_price,
                    spread = ?book.spread,
                    trades = feed.trades().len(),
                    decode_errors = feed.decode_errors(),
                    "Feed snapshot"
                );
            }
        }
    }

    feed.stop();

    Ok(())
}
