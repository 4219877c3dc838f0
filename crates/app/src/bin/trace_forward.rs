//! Post-tool hook: reads one JSON tool-call record from stdin and relays it
//! to the tracing backend. Always exits 0 and prints nothing.

use doc_ingest_core::{forward_record, TraceConfig};
use std::io::Read;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut raw = String::new();
    if let Err(error) = std::io::stdin().read_to_string(&mut raw) {
        debug!(error = %error, "could not read stdin");
        return;
    }

    let outcome = forward_record(&raw, TraceConfig::from_env());
    debug!(?outcome, "trace forwarder finished");
}
