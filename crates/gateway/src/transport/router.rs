use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use a2a_types::AgentCard;

use crate::a2a::A2aCapability;
use crate::auth::Authenticator;
use crate::session::SessionManager;

/// Whether a `/mcp` POST that expects responses streams them over SSE or
/// returns a single JSON body. A server-wide, operator-configured choice,
/// not negotiated per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mcp2025StreamMode {
	Json,
	Sse,
}

#[derive(Clone)]
pub struct AppState {
	pub sessions: Arc<SessionManager>,
	pub authenticator: Arc<Authenticator>,
	pub a2a: Arc<A2aCapability>,
	pub agent_card: Arc<AgentCard>,
	pub keepalive: Duration,
	pub response_timeout: Duration,
	pub mcp2025_stream_mode: Mcp2025StreamMode,
}

/// Merges the three per-dialect sub-routers into one top-level router.
pub fn build_router(state: AppState) -> Router {
	let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

	Router::new()
		.merge(super::mcp2024::router())
		.merge(super::mcp2025::router())
		.merge(super::a2a_http::router())
		.layer(TraceLayer::new_for_http())
		.layer(cors)
		.with_state(state)
}
