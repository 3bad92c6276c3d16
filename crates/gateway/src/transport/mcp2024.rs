//! MCP-2024 transport: GET `/sse` opens a stream and announces a POST
//! `endpoint`; POST `/sse?session_id=...` enqueues a body against that
//! session.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::jsonrpc;
use crate::session::SessionStatus;

use super::sse::{endpoint_event, message_event, ping_event, EventIdCounter};
use super::{extract_credential, AppState, TransportError};

pub fn router() -> Router<AppState> {
	Router::new().route("/sse", get(handle_get).post(handle_post).options(handle_options))
}

async fn handle_get(
	State(state): State<AppState>,
	Query(query): Query<HashMap<String, String>>,
	headers: HeaderMap,
) -> Result<impl IntoResponse, TransportError> {
	let credential = extract_credential(&headers, query.get("key").map(|s| s.as_str()));
	let user_id = state
		.authenticator
		.authenticate(credential.as_deref(), false)
		.await
		.map_err(|_| TransportError::Unauthorized)?;

	let session = state.sessions.create(user_id);
	session.set_status(SessionStatus::Connecting);
	session.set_status(SessionStatus::Connected);
	let mut guard = session.acquire_output().map_err(|_| TransportError::SessionBusy)?;

	let endpoint = format!("/sse?session_id={}", session.id);
	let keepalive = state.keepalive;
	let ids = EventIdCounter::default();
	// Moved into the generator so its Drop runs whether the loop below exits
	// normally or the stream is dropped early by a client disconnect.
	let _cleanup = super::SessionCloseGuard::new(state.sessions.clone(), session.id.clone());

	let stream = async_stream::stream! {
		let _cleanup = _cleanup;
		yield Ok::<_, std::convert::Infallible>(endpoint_event(&endpoint));
		loop {
			tokio::select! {
				next = guard.recv() => match next {
					Some(value) => yield Ok(message_event(&ids, &value)),
					None => break,
				},
				_ = tokio::time::sleep(keepalive) => {
					yield Ok(ping_event());
				}
			}
		}
	};

	Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(keepalive)))
}

async fn handle_post(
	State(state): State<AppState>,
	Query(query): Query<HashMap<String, String>>,
	body: axum::body::Bytes,
) -> Result<impl IntoResponse, TransportError> {
	let session_id = query.get("session_id").ok_or(TransportError::MissingSessionId("session_id"))?;
	let session = state
		.sessions
		.get(session_id)
		.map_err(|_| TransportError::UnknownSession(session_id.clone()))?;

	// Per-message errors here are logged and swallowed: the protocol expects
	// responses to flow back over the already-open SSE stream, not in this
	// response body.
	match jsonrpc::parse(&body) {
		Ok(items) => {
			for item in items {
				match item {
					Ok(message) => state.sessions.input().put(&session, message).await,
					Err(err) => tracing::debug!(session_id = %session.id, ?err, "dropping malformed MCP-2024 message"),
				}
			}
		},
		Err(err) => tracing::debug!(session_id = %session.id, %err, "dropping malformed MCP-2024 body"),
	}

	Ok(StatusCode::ACCEPTED)
}

async fn handle_options() -> impl IntoResponse {
	(StatusCode::NO_CONTENT, [("Allow", "GET,POST,OPTIONS")])
}
