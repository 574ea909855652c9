//! Structured log sink.
//!
//! Every component logs through `tracing` macros. The binary installs one
//! JSON subscriber at startup; libraries and tests never install one, so a
//! test run stays quiet unless the test opts in.

use tracing::Level;

use crate::error::Error;

/// Installs a JSON subscriber on stdout that records events at `level` and
/// above, including the fields of the enclosing request span.
pub fn init(level: Level) -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_max_level(level)
        .with_current_span(true)
        .with_span_list(false)
        .with_target(false)
        .try_init()
        .map_err(|e| Error::Logger(e.to_string()))
}
