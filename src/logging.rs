//! Logger setup for the command-line tools.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to binaries. `RUST_LOG` overrides the default filter.
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "hawkes_optim=info,hawkes_varying_baseline=info";
const VERBOSE_FILTER: &str = "hawkes_optim=debug,hawkes_varying_baseline=debug,info";

pub fn init_cli_logger(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
