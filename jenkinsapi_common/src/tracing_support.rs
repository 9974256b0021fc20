//! Logging configuration for our command-line tools.

use std::{io::IsTerminal, sync::Once};

use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Install a `tracing` subscriber which writes to standard error.
///
/// `default_level` applies unless `RUST_LOG` says otherwise. Only the first
/// call has any effect, so tests may call this freely.
pub fn initialize_tracing(default_level: LevelFilter) {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy();
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .init();
    });
}
