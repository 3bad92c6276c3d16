//! HTTP front end (component C6): dispatches by path, method and Accept
//! header to the three dialect handlers, and owns SSE framing/keepalive.

pub mod a2a_http;
pub mod mcp2024;
pub mod mcp2025;
pub mod router;
pub mod sse;

pub use router::{build_router, AppState, Mcp2025StreamMode};

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, Header};
use thiserror::Error;

/// Extracts a bearer credential from `Authorization: Bearer <k>`, falling
/// back to a query-string `key` for transports (MCP-2024) that authenticate
/// over a plain GET with no header support on the client side.
pub fn extract_credential(headers: &HeaderMap, query_key: Option<&str>) -> Option<String> {
	let mut values = headers.get_all(axum::http::header::AUTHORIZATION).iter();
	if let Ok(auth) = Authorization::<Bearer>::decode(&mut values) {
		return Some(auth.token().to_string());
	}
	query_key.map(|k| k.to_string())
}

/// Closes a session when dropped, regardless of whether the holding future
/// ran to completion or was canceled mid-stream by a client disconnect.
/// Giving a stream generator ownership of one of these is how MCP-2024/A2A
/// SSE handlers guarantee session cleanup without relying on a "None" branch
/// that a still-alive `Arc<Session>` would never actually reach.
pub struct SessionCloseGuard {
	sessions: std::sync::Arc<crate::session::SessionManager>,
	session_id: String,
}

impl SessionCloseGuard {
	pub fn new(sessions: std::sync::Arc<crate::session::SessionManager>, session_id: String) -> Self {
		Self { sessions, session_id }
	}
}

impl Drop for SessionCloseGuard {
	fn drop(&mut self) {
		self.sessions.close(&self.session_id);
	}
}

#[derive(Debug, Error)]
pub enum TransportError {
	#[error("method not allowed")]
	MethodNotAllowed,
	#[error("missing or invalid Accept header")]
	InvalidAccept,
	#[error("missing or invalid Content-Type header")]
	InvalidContentType,
	#[error("missing {0} header")]
	MissingSessionId(&'static str),
	#[error("unknown session: {0}")]
	UnknownSession(String),
	#[error("authentication failed")]
	Unauthorized,
	#[error("session already has an active stream consumer")]
	SessionBusy,
	#[error("malformed request body: {0}")]
	Body(String),
}

impl IntoResponse for TransportError {
	fn into_response(self) -> Response {
		let status = match self {
			TransportError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
			TransportError::InvalidAccept | TransportError::InvalidContentType | TransportError::Body(_) => {
				StatusCode::BAD_REQUEST
			},
			TransportError::MissingSessionId(_) | TransportError::UnknownSession(_) => StatusCode::BAD_REQUEST,
			TransportError::Unauthorized => StatusCode::UNAUTHORIZED,
			TransportError::SessionBusy => StatusCode::CONFLICT,
		};
		(status, self.to_string()).into_response()
	}
}
