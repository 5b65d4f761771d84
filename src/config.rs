//! Application configuration loaded from environment variables.
//!
//! Endpoints default to the public Reya production URLs and can be
//! overridden with:
//! - `REYA_WEBSOCKET_URL` — WebSocket v2 feed endpoint
//! - `REYA_REST_URL` — REST API base used for candle history

use std::time::Duration;

/// Default public WebSocket endpoint.
const DEFAULT_WEBSOCKET_URL: &str = "wss://ws.reya.xyz";

/// Default REST API base URL.
const DEFAULT_REST_URL: &str = "https://api.reya.xyz/v2";

/// Market shown when no symbol has been selected yet.
pub const DEFAULT_SYMBOL: &str = "BTCRUSDPERP";

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub reya: ReyaConfig,
}

/// Reya-specific endpoint values.
#[derive(Debug, Clone)]
pub struct ReyaConfig {
    pub websocket_url: String,
    pub rest_url: String,
}

/// Engine tunables. The defaults match the production trading interface.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Initial reconnect backoff delay.
    pub reconnect_base: Duration,
    /// Backoff ceiling; delays double up to this value.
    pub reconnect_max: Duration,
    /// Levels kept per order book side.
    pub book_depth: usize,
    /// Executions kept in the trade tape.
    pub tape_capacity: usize,
    /// Full candle-history page size; a shorter page means end of history.
    pub history_page_size: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            reconnect_base: Duration::from_secs(1),
            reconnect_max: Duration::from_secs(30),
            book_depth: 15,
            tape_capacity: 100,
            history_page_size: 200,
        }
    }
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`RillError::Config`](crate::RillError::Config) if an override
/// is present but carries the wrong URL scheme.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let websocket_url =
        non_empty_var("REYA_WEBSOCKET_URL").unwrap_or_else(|| DEFAULT_WEBSOCKET_URL.to_string());
    let rest_url = non_empty_var("REYA_REST_URL").unwrap_or_else(|| DEFAULT_REST_URL.to_string());

    if !websocket_url.starts_with("ws://") && !websocket_url.starts_with("wss://") {
        return Err(crate::RillError::Config(format!(
            "REYA_WEBSOCKET_URL must be a ws:// or wss:// URL, got {websocket_url}"
        )));
    }
    if !rest_url.starts_with("http://") && !rest_url.starts_with("https://") {
        return Err(crate::RillError::Config(format!(
            "REYA_REST_URL must be an http:// or https:// URL, got {rest_url}"
        )));
    }

    Ok(AppConfig {
        reya: ReyaConfig {
            websocket_url,
            rest_url,
        },
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper that temporarily sets env vars, runs `f`, then restores originals.
    ///
    /// # Safety
    ///
    /// Tests using this helper must run with `--test-threads=1` or otherwise
    /// ensure no other threads read these env vars concurrently.
    fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        let originals: Vec<(&str, Option<String>)> = vars
            .iter()
            .map(|(k, _)| (*k, std::env::var(k).ok()))
            .collect();

        for (k, v) in vars {
            // SAFETY: config tests run single-threaded (see test runner config).
            unsafe {
                match v {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }

        f();

        for (k, original) in originals {
            // SAFETY: restoring original values, same single-threaded context.
            unsafe {
                match original {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn defaults_without_env_vars() {
        with_env(
            &[("REYA_WEBSOCKET_URL", None), ("REYA_REST_URL", None)],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.reya.websocket_url, DEFAULT_WEBSOCKET_URL);
                assert_eq!(config.reya.rest_url, DEFAULT_REST_URL);
            },
        );
    }

    #[test]
    fn custom_endpoints() {
        with_env(
            &[
                ("REYA_WEBSOCKET_URL", Some("wss://staging.example.com")),
                ("REYA_REST_URL", Some("https://staging.example.com/v2")),
            ],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.reya.websocket_url, "wss://staging.example.com");
                assert_eq!(config.reya.rest_url, "https://staging.example.com/v2");
            },
        );
    }

    #[test]
    fn rejects_non_websocket_scheme() {
        with_env(
            &[
                ("REYA_WEBSOCKET_URL", Some("https://ws.reya.xyz")),
                ("REYA_REST_URL", None),
            ],
            || {
                let err = fetch_config().unwrap_err();
                assert!(err.to_string().contains("ws:// or wss://"));
            },
        );
    }

    #[test]
    fn rejects_non_http_rest_scheme() {
        with_env(
            &[
                ("REYA_WEBSOCKET_URL", None),
                ("REYA_REST_URL", Some("ftp://api.reya.xyz")),
            ],
            || {
                let err = fetch_config().unwrap_err();
                assert!(err.to_string().contains("http:// or https://"));
            },
        );
    }

    #[test]
    fn empty_values_treated_as_absent() {
        with_env(
            &[("REYA_WEBSOCKET_URL", Some("")), ("REYA_REST_URL", Some(""))],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.reya.websocket_url, DEFAULT_WEBSOCKET_URL);
                assert_eq!(config.reya.rest_url, DEFAULT_REST_URL);
            },
        );
    }

    #[test]
    fn default_settings_match_production_interface() {
        let settings = FeedSettings::default();
        assert_eq!(settings.reconnect_base, Duration::from_secs(1));
        assert_eq!(settings.reconnect_max, Duration::from_secs(30));
        assert_eq!(settings.book_depth, 15);
        assert_eq!(settings.tape_capacity, 100);
        assert_eq!(settings.history_page_size, 200);
    }
}
