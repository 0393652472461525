//! The one global logging sink (§6: "a single sink (stderr) with fields
//! `timestamp`, `component`, `level`, `message`"). Each crate's `tracing`
//! calls carry `component = "..."` as a field rather than a separate
//! logger instance, mirroring the source's component-tagged log lines.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install the process-wide `tracing-subscriber` sink. Idempotent: later
/// calls are no-ops, so a host binding can call this defensively without
/// coordinating with whoever else in the process might also call it.
pub fn init_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    });
}
