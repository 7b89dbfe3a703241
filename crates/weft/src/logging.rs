#![forbid(unsafe_code)]

//! Log output for weft applications.
//!
//! weft emits `tracing` events under `weft.*` targets:
//!
//! | target           | what                                      |
//! |------------------|-------------------------------------------|
//! | `weft.config`    | stored and declined config values         |
//! | `weft.tree`      | virtual tree mutations                    |
//! | `weft.patch`     | commits, slow commits, cancelled slots    |
//! | `weft.lifecycle` | construction, mount state, destroy        |
//! | `weft.handler`   | listener binding and handler failures     |
//! | `weft.dispatch`  | event delivery and the nested-event queue |
//! | `weft.calendar`  | week view paging and layout               |
//!
//! [`init`] installs a formatting subscriber filtered by `WEFT_LOG`
//! (`RUST_LOG` syntax), falling back to `info`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "WEFT_LOG";

const DEFAULT_FILTER: &str = "info";

/// Filter from `WEFT_LOG`, or `default` when unset or invalid.
#[must_use]
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// Returns `false` when a global subscriber was already set.
pub fn init() -> bool {
    init_with_default(DEFAULT_FILTER)
}

/// Like [`init`], with a different fallback filter.
pub fn init_with_default(default: &str) -> bool {
    let layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter(default))
        .with(layer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_existing_subscriber() {
        let _ = init_with_default("weft=debug");
        assert!(!init());
    }

    #[test]
    fn invalid_fallback_uses_info() {
        if std::env::var_os(LOG_ENV).is_none() {
            assert_eq!(env_filter("weft=loud").to_string(), "info");
        }
    }
}
