//! Diagnostic logging to stderr
//!
//! `RUST_LOG` takes precedence; otherwise `--verbose` enables debug events
//! and `--quiet` keeps only errors. User-facing progress goes through
//! [`crate::ui::Reporter`], not through here.

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Directive used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time()
        .with_filter(filter);

    // Already initialised (tests, repeated calls) is fine.
    let _ = tracing_subscriber::registry().with(layer).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false, false), "warn");
        assert_eq!(default_directive(true, false), "debug");
        assert_eq!(default_directive(false, true), "error");
        assert_eq!(default_directive(true, true), "debug");
    }

    #[test]
    fn test_init_twice() {
        init(false, true);
        init(true, false);
    }
}
