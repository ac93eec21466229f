//! Log setup for the `nepflake` binary.
//!
//! Logs always go to stderr so stdout carries nothing but IDs and can be piped
//! straight into another tool. Verbosity follows `RUST_LOG` (default `info`);
//! `nepflake=trace` also surfaces the generator's per-call spans.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_thread_ids(true)
        .with_target(false)
        .with_timer(fmt::time::ChronoLocal::rfc_3339());

    // The JSON formatter is a different type, so each branch installs its own.
    if json {
        registry.with(layer.json()).try_init()?;
    } else {
        registry.with(layer).try_init()?;
    }

    Ok(())
}
