//! Logging setup: structured `tracing` spans and events via
//! `tracing-subscriber`'s env-filter and fmt layers. No OTel exporter is
//! wired up here; that's a separate observability backend concern.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global `tracing` subscriber. Call once at process start.
/// The filter defaults to `info` and is overridable via `RUST_LOG`.
pub fn init() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}
