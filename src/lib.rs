//! cicsprobe - CICS transaction ID enumeration over TN3270
//!
//! Connects to a CICS region as a 3270 terminal, checks that the configured
//! init commands really reach CICS, then tries transaction IDs one at a time
//! and classifies the screen each one leaves behind.

pub mod candidates;
pub mod config;
pub mod engine;
pub mod enumerate;
pub mod session;
pub mod tn3270;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter for a `-v` count
pub fn log_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize logging. `RUST_LOG` wins over the verbosity flag.
pub fn init_logging(verbosity: u8) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level(verbosity))),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
