//! A2A transport: a single JSON-RPC endpoint at `/a2a`, switching to SSE for
//! `tasks/sendSubscribe` when the client asks for `text/event-stream`.
//! Discovery document served at `/.well-known/agent.json`, matching the
//! pattern other A2A front ends use for agent-card discovery.

use axum::extract::State;
use axum::response::sse::{KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde_json::Value;
use tokio::sync::mpsc;

use a2a_types::{TaskIdParams, TaskQueryParams, TaskResubscriptionParams, TaskSendParams};

use crate::jsonrpc::{self, Message, RequestId, RpcError};

use super::sse::EventIdCounter;
use super::{AppState, TransportError};

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/a2a", post(handle_post))
		.route("/.well-known/agent.json", get(handle_agent_card))
}

async fn handle_agent_card(State(state): State<AppState>) -> impl IntoResponse {
	Json((*state.agent_card).clone())
}

/// A2A carries no JSON-RPC batch semantics: a single request object is
/// parsed; a batch array is rejected with InvalidRequest.
async fn handle_post(
	State(state): State<AppState>,
	headers: axum::http::HeaderMap,
	body: axum::body::Bytes,
) -> Result<axum::response::Response, TransportError> {
	let items = jsonrpc::parse(&body).map_err(|e| TransportError::Body(e.to_string()))?;
	if items.len() != 1 {
		return Err(TransportError::Body("A2A does not support JSON-RPC batches".to_string()));
	}
	let message = match items.into_iter().next().unwrap() {
		Ok(message) => message,
		Err(err) => return Ok(Json(jsonrpc::emit_error(err.id, err.error)).into_response()),
	};

	let Message::Request(request) = message else {
		return Ok(
			Json(jsonrpc::emit_error(None, RpcError::invalid_request("A2A expects a single request")))
				.into_response(),
		);
	};

	let wants_sse = headers
		.get(axum::http::header::ACCEPT)
		.and_then(|v| v.to_str().ok())
		.is_some_and(|v| v.contains("text/event-stream"));

	if request.method == "tasks/sendSubscribe" && wants_sse {
		return handle_send_subscribe(state, request.id, request.params).await;
	}

	let result = dispatch(&state, &request.method, request.params).await;
	let body = match result {
		Ok(value) => jsonrpc::emit_success(request.id, value),
		Err(error) => jsonrpc::emit_error(Some(request.id), error),
	};
	Ok(Json(body).into_response())
}

async fn dispatch(state: &AppState, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
	match method {
		"tasks/send" => {
			let params = parse_params::<TaskSendParams>(params)?;
			state.a2a.send(params).await
		},
		"tasks/get" => {
			let params = parse_params::<TaskQueryParams>(params)?;
			state.a2a.get(params).await
		},
		"tasks/cancel" => {
			let params = parse_params::<TaskIdParams>(params)?;
			state.a2a.cancel(params).await
		},
		"tasks/resubscribe" => {
			let params = parse_params::<TaskResubscriptionParams>(params)?;
			state.a2a.resubscribe(params).await
		},
		"tasks/pushNotification/set" | "tasks/pushNotification/get" => {
			Err(state.a2a.push_notification_unsupported())
		},
		other => Err(RpcError::method_not_found(other)),
	}
}

async fn handle_send_subscribe(
	state: AppState,
	request_id: RequestId,
	params: Option<Value>,
) -> Result<axum::response::Response, TransportError> {
	let params = match parse_params::<TaskSendParams>(params) {
		Ok(p) => p,
		Err(error) => return Ok(Json(jsonrpc::emit_error(Some(request_id), error)).into_response()),
	};

	let (tx, mut rx) = mpsc::channel(64);
	let snapshot = match state.a2a.send_subscribe(params, tx).await {
		Ok(snapshot) => snapshot,
		Err(error) => return Ok(Json(jsonrpc::emit_error(Some(request_id), error)).into_response()),
	};

	// The initial JSON-RPC response carries the task snapshot; the SSE body
	// that follows carries only status/artifact update events.
	let initial = jsonrpc::emit_success(request_id, snapshot);
	let ids = EventIdCounter::default();
	let keepalive = state.keepalive;

	let stream = async_stream::stream! {
		yield Ok::<_, std::convert::Infallible>(
			axum::response::sse::Event::default().id(ids.next()).event("message").data(initial.to_string())
		);
		loop {
			tokio::select! {
				next = rx.recv() => match next {
					Some(event) => {
						let is_final = matches!(&event, crate::a2a::TaskUpdateEvent::Status { is_final: true, .. });
						let payload = serde_json::to_value(&event).unwrap_or(Value::Null);
						yield Ok(axum::response::sse::Event::default().id(ids.next()).event("message").data(payload.to_string()));
						if is_final {
							break;
						}
					},
					None => break,
				},
				_ = tokio::time::sleep(keepalive) => {
					yield Ok(axum::response::sse::Event::default().event("ping").data("{}"));
				}
			}
		}
	};

	Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(keepalive)).into_response())
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, RpcError> {
	let params = params.ok_or_else(|| RpcError::invalid_params("missing params"))?;
	serde_json::from_value(params).map_err(|e| RpcError::invalid_params(e.to_string()))
}
