use std::io;

use tracing::Level;

/// Map the number of `-v` flags to a level. Diagnostics are quiet by
/// default because stdout carries the interactive protocol.
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber. Diagnostics go to stderr so they never
/// interleave with the prompt or the results on stdout.
pub fn init_logging(verbosity: u8) {
    tracing_subscriber::fmt()
        .with_max_level(level_for(verbosity))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
