//! MCP-2025 transport: a single `/mcp` endpoint where POST returns either a
//! JSON body or an SSE stream depending on server streaming mode, and
//! session identity travels in the `Mcp-Session-Id` header. Modeled on the
//! teacher's `StreamableHttpService`.

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::sse::{KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::jsonrpc::{self, Message};

use super::sse::{message_event, ping_event, EventIdCounter};
use super::{extract_credential, AppState, TransportError};

const SESSION_HEADER: &str = "mcp-session-id";

pub fn router() -> Router<AppState> {
	Router::new().route(
		"/mcp",
		get(handle_get).post(handle_post).delete(handle_delete).options(handle_options),
	)
}

async fn handle_get() -> Result<(), TransportError> {
	// Resuming a live stream via GET is not supported by this dialect.
	Err(TransportError::MethodNotAllowed)
}

async fn handle_delete(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<impl IntoResponse, TransportError> {
	let session_id = session_header(&headers)?;
	state.sessions.close(session_id);
	Ok(StatusCode::NO_CONTENT)
}

async fn handle_options() -> impl IntoResponse {
	(StatusCode::NO_CONTENT, [("Allow", "GET,POST,DELETE,OPTIONS")])
}

fn session_header(headers: &HeaderMap) -> Result<&str, TransportError> {
	headers
		.get(SESSION_HEADER)
		.ok_or(TransportError::MissingSessionId(SESSION_HEADER))?
		.to_str()
		.map_err(|_| TransportError::Body("invalid Mcp-Session-Id header".to_string()))
}

fn wants_sse(headers: &HeaderMap) -> bool {
	headers
		.get(axum::http::header::ACCEPT)
		.and_then(|v| v.to_str().ok())
		.is_some_and(|v| v.contains("text/event-stream"))
}

fn is_batch(body: &[u8]) -> bool {
	body.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'[')
}

async fn handle_post(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: axum::body::Bytes,
) -> Result<axum::response::Response, TransportError> {
	let session = match headers.get(SESSION_HEADER) {
		Some(value) => {
			let id = value.to_str().map_err(|_| TransportError::Body("invalid session header".to_string()))?;
			state.sessions.get(id).map_err(|_| TransportError::UnknownSession(id.to_string()))?
		},
		None => {
			let credential = extract_credential(&headers, None);
			let user_id = state
				.authenticator
				.authenticate(credential.as_deref(), false)
				.await
				.map_err(|_| TransportError::Unauthorized)?;
			let session = state.sessions.create(user_id);
			session.set_status(crate::session::SessionStatus::Connecting);
			session.set_status(crate::session::SessionStatus::Connected);
			session
		},
	};

	let session_id_header =
		HeaderValue::from_str(&session.id).map_err(|_| TransportError::Body("invalid session id".to_string()))?;

	let batch = is_batch(&body);
	let items = jsonrpc::parse(&body).map_err(|e| TransportError::Body(e.to_string()))?;

	let expected_responses = items
		.iter()
		.filter(|item| match item {
			Ok(Message::Request(_)) => true,
			Err(err) => err.id.is_some(),
			_ => false,
		})
		.count();

	if expected_responses == 0 {
		for item in items {
			if let Ok(message) = item {
				state.sessions.input().put(&session, message).await;
			}
		}
		let mut response = StatusCode::ACCEPTED.into_response();
		response.headers_mut().insert(SESSION_HEADER, session_id_header);
		return Ok(response);
	}

	let mut guard = session.acquire_output().map_err(|_| TransportError::SessionBusy)?;
	let input = state.sessions.input().clone();
	for item in items {
		match item {
			Ok(message) => input.put(&session, message).await,
			Err(err) => {
				let _ = session.send_error(err.id, err.error).await;
			},
		}
	}

	let stream_mode_sse =
		wants_sse(&headers) && state.mcp2025_stream_mode == super::router::Mcp2025StreamMode::Sse;

	if stream_mode_sse {
		let ids = EventIdCounter::default();
		let keepalive = state.keepalive;
		let remaining = expected_responses;
		let sse_stream = async_stream::stream! {
			let mut left = remaining;
			while left > 0 {
				tokio::select! {
					next = guard.recv() => match next {
						Some(value) => {
							yield Ok::<_, std::convert::Infallible>(message_event(&ids, &value));
							left -= 1;
						},
						None => break,
					},
					_ = tokio::time::sleep(keepalive) => {
						yield Ok(ping_event());
					}
				}
			}
		};
		let mut response =
			Sse::new(sse_stream).keep_alive(KeepAlive::new().interval(keepalive)).into_response();
		response.headers_mut().insert(SESSION_HEADER, session_id_header);
		return Ok(response);
	}

	let mut values = Vec::with_capacity(expected_responses);
	for _ in 0..expected_responses {
		match tokio::time::timeout(state.response_timeout, guard.recv()).await {
			Ok(Some(value)) => values.push(value),
			Ok(None) => break,
			Err(_) => values.push(jsonrpc::emit_error(None, crate::jsonrpc::RpcError::internal_error("timeout"))),
		}
	}
	drop(guard);

	let body = if batch {
		serde_json::Value::Array(values)
	} else {
		values.into_iter().next().unwrap_or(serde_json::Value::Null)
	};

	let mut response = axum::Json(body).into_response();
	response.headers_mut().insert(SESSION_HEADER, session_id_header);
	Ok(response)
}
