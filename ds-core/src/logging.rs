use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{
    fmt,
    EnvFilter,
};

/// Install the process-wide tracing subscriber.
///
/// `env_filter` accepts anything `EnvFilter` does (`info`, `ds_gen=debug,warn`, ...). Span close
/// events are emitted so that `#[instrument]`-ed stages report their duration.
pub fn setup(env_filter: &str) {
    let fmt_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(EnvFilter::new(env_filter))
        .init();
}
