//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the Vitalstat tracing/logging system.
///
/// Reads the `VITALSTAT_LOG` environment variable for per-subsystem log levels.
/// Format: `VITALSTAT_LOG=vitalstat_analysis::anomaly=debug,vitalstat_core=warn`
///
/// Falls back to `vitalstat=info` if `VITALSTAT_LOG` is not set or is invalid.
/// Safe to call more than once; a subscriber installed elsewhere wins.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("VITALSTAT_LOG")
            .unwrap_or_else(|_| EnvFilter::new("vitalstat=info"));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
