//! Method dispatch (component C3).

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::FutureExt;
use serde_json::Value;

use crate::jsonrpc::{Message, RpcError};

use super::session::Session;

/// A registered method handler. Implementations decode `params` themselves;
/// the codec never commits to a schema.
#[async_trait]
pub trait MethodHandler: Send + Sync {
	async fn handle(&self, session: &Arc<Session>, params: Option<Value>) -> Result<Value, RpcError>;
}

#[derive(Default)]
pub struct InputProcessor {
	handlers: DashMap<String, Arc<dyn MethodHandler>>,
}

impl InputProcessor {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&self, method: impl Into<String>, handler: Arc<dyn MethodHandler>) {
		self.handlers.insert(method.into(), handler);
	}

	/// Dispatches one parsed message against the registry and writes the
	/// outcome to the session's output channel. Notifications dispatch their
	/// handler but never produce a response. A handler panic is caught and
	/// converted to `InternalError` rather than taking down the worker.
	pub async fn put(&self, session: &Arc<Session>, message: Message) {
		session.touch();
		match message {
			Message::Request(req) => {
				let result = self.dispatch(session, &req.method, req.params).await;
				let send = match result {
					Ok(value) => session.send_response(req.id.clone(), value).await,
					Err(error) => session.send_error(Some(req.id), error).await,
				};
				if let Err(err) = send {
					tracing::debug!(session_id = %session.id, %err, "dropped response to closed session");
				}
			},
			Message::Notification(note) => {
				let _ = self.dispatch(session, &note.method, note.params).await;
			},
			Message::Response(_) | Message::Error(_) => {
				// Correlated against pending server-initiated requests by the
				// transport layer before reaching here; nothing left to do.
			},
		}
	}

	async fn dispatch(
		&self,
		session: &Arc<Session>,
		method: &str,
		params: Option<Value>,
	) -> Result<Value, RpcError> {
		let Some(handler) = self.handlers.get(method).map(|h| h.clone()) else {
			return Err(RpcError::method_not_found(method));
		};
		match AssertUnwindSafe(handler.handle(session, params)).catch_unwind().await {
			Ok(result) => result,
			Err(_) => Err(RpcError::internal_error(format!("handler for \"{method}\" panicked"))),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::jsonrpc::{NotificationMessage, RequestId, RequestMessage};

	struct Echo;

	#[async_trait]
	impl MethodHandler for Echo {
		async fn handle(&self, _session: &Arc<Session>, params: Option<Value>) -> Result<Value, RpcError> {
			Ok(params.unwrap_or(Value::Null))
		}
	}

	struct Panics;

	#[async_trait]
	impl MethodHandler for Panics {
		async fn handle(&self, _session: &Arc<Session>, _params: Option<Value>) -> Result<Value, RpcError> {
			panic!("boom")
		}
	}

	fn session() -> Arc<Session> {
		Session::new("s1".into(), "anonymous".into(), 8)
	}

	#[tokio::test]
	async fn unknown_method_is_method_not_found() {
		let input = InputProcessor::new();
		let session = session();
		let mut guard = session.acquire_output().unwrap();
		input
			.put(
				&session,
				Message::Request(RequestMessage {
					id: RequestId::Number(1),
					method: "nope".into(),
					params: None,
				}),
			)
			.await;
		let out = guard.recv().await.unwrap();
		assert_eq!(out["error"]["code"], crate::jsonrpc::METHOD_NOT_FOUND);
	}

	#[tokio::test]
	async fn registered_method_echoes_params() {
		let input = InputProcessor::new();
		input.register("echo", Arc::new(Echo));
		let session = session();
		let mut guard = session.acquire_output().unwrap();
		input
			.put(
				&session,
				Message::Request(RequestMessage {
					id: RequestId::Number(2),
					method: "echo".into(),
					params: Some(serde_json::json!({"a": 1})),
				}),
			)
			.await;
		let out = guard.recv().await.unwrap();
		assert_eq!(out["result"]["a"], 1);
	}

	#[tokio::test]
	async fn notification_produces_no_response() {
		let input = InputProcessor::new();
		input.register("echo", Arc::new(Echo));
		let session = session();
		let mut guard = session.acquire_output().unwrap();
		input
			.put(
				&session,
				Message::Notification(NotificationMessage {
					method: "echo".into(),
					params: None,
				}),
			)
			.await;
		let timeout = tokio::time::timeout(std::time::Duration::from_millis(50), guard.recv()).await;
		assert!(timeout.is_err(), "notification must not enqueue a response");
	}

	#[tokio::test]
	async fn handler_panic_becomes_internal_error() {
		let input = InputProcessor::new();
		input.register("boom", Arc::new(Panics));
		let session = session();
		let mut guard = session.acquire_output().unwrap();
		input
			.put(
				&session,
				Message::Request(RequestMessage {
					id: RequestId::Number(3),
					method: "boom".into(),
					params: None,
				}),
			)
			.await;
		let out = guard.recv().await.unwrap();
		assert_eq!(out["error"]["code"], crate::jsonrpc::INTERNAL_ERROR);
	}
}
