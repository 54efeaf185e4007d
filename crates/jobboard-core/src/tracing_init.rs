//! Tracing setup for binaries embedding the client.
//!
//! Log lines go to stderr so they never mix with command output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_filter` (e.g. `"warn"` or
/// `"jobboard_client=debug"`). With `log_json` every event is one JSON line.
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(default_filter: &str, log_json: bool) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let json = log_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let plain = (!log_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_refused() {
        init_tracing("warn", false);
        assert!(!init_tracing("debug", true));
    }
}
