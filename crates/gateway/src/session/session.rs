//! Per-connection state (component C4).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::jsonrpc::{RequestId, RpcError};

/// A session's position in the connection lifecycle. `Closed` is terminal;
/// every other transition follows New → Connecting → Connected, with
/// Connected ⇄ Disconnected allowed for reconnecting transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
	New,
	Connecting,
	Connected,
	Disconnected,
	Closed,
}

fn is_legal_transition(from: SessionStatus, to: SessionStatus) -> bool {
	use SessionStatus::*;
	matches!(
		(from, to),
		(New, Connecting)
			| (New, Closed)
			| (Connecting, Connected)
			| (Connecting, Closed)
			| (Connected, Disconnected)
			| (Connected, Closed)
			| (Disconnected, Connected)
			| (Disconnected, Closed)
	)
}

#[derive(Debug, Error, Clone)]
pub enum SessionError {
	#[error("session not found: {0}")]
	NotFound(String),
	#[error("session is closed")]
	Closed,
	#[error("output consumer already held")]
	ConsumerAlreadyHeld,
}

/// A server-initiated request awaiting the client's response.
struct PendingRequest {
	responder: oneshot::Sender<Result<Value, RpcError>>,
	#[allow(dead_code)]
	deadline: Instant,
}

/// Exclusive handle over a session's output channel, obtained via
/// [`Session::acquire_output`]. Dropping the guard returns the receiver to
/// the session so a later consumer can acquire it again.
pub struct OutputGuard {
	session: Arc<Session>,
	receiver: Option<mpsc::Receiver<Value>>,
}

impl OutputGuard {
	pub async fn recv(&mut self) -> Option<Value> {
		self.receiver.as_mut().expect("guard always holds a receiver").recv().await
	}
}

impl Drop for OutputGuard {
	fn drop(&mut self) {
		if let Some(receiver) = self.receiver.take() {
			*self.session.output_rx.lock() = Some(receiver);
		}
		self.session.consumer_held.store(false, Ordering::Release);
	}
}

pub struct Session {
	pub id: String,
	pub user_id: String,
	status: ArcSwap<SessionStatus>,
	params: DashMap<String, Value>,
	output_tx: Mutex<Option<mpsc::Sender<Value>>>,
	output_rx: Mutex<Option<mpsc::Receiver<Value>>>,
	consumer_held: AtomicBool,
	pending: DashMap<RequestId, PendingRequest>,
	last_activity: Mutex<Instant>,
	closed: AtomicBool,
}

impl Session {
	pub fn new(id: String, user_id: String, output_capacity: usize) -> Arc<Session> {
		let (tx, rx) = mpsc::channel(output_capacity);
		Arc::new(Session {
			id,
			user_id,
			status: ArcSwap::new(Arc::new(SessionStatus::New)),
			params: DashMap::new(),
			output_tx: Mutex::new(Some(tx)),
			output_rx: Mutex::new(Some(rx)),
			consumer_held: AtomicBool::new(false),
			pending: DashMap::new(),
			last_activity: Mutex::new(Instant::now()),
			closed: AtomicBool::new(false),
		})
	}

	pub fn status(&self) -> SessionStatus {
		**self.status.load()
	}

	/// Applies a status transition if legal; an illegal one is a no-op logged
	/// at warn level, never a panic (a racing transport worker and idle
	/// sweeper can both attempt to move a session at once).
	pub fn set_status(&self, new: SessionStatus) {
		let current = self.status();
		if current == SessionStatus::Closed {
			tracing::warn!(session_id = %self.id, "ignoring status transition out of closed session");
			return;
		}
		if !is_legal_transition(current, new) {
			tracing::warn!(session_id = %self.id, ?current, ?new, "ignoring illegal session status transition");
			return;
		}
		self.status.store(Arc::new(new));
	}

	pub fn set_param(&self, key: impl Into<String>, value: Value) {
		self.params.insert(key.into(), value);
	}

	pub fn param(&self, key: &str) -> Option<Value> {
		self.params.get(key).map(|v| v.clone())
	}

	pub fn touch(&self) {
		*self.last_activity.lock() = Instant::now();
	}

	pub fn idle_for(&self) -> Duration {
		self.last_activity.lock().elapsed()
	}

	/// Acquires exclusive consumer rights over the output channel. Fails
	/// immediately, never blocks, if another consumer already holds it.
	pub fn acquire_output(self: &Arc<Self>) -> Result<OutputGuard, SessionError> {
		if self.consumer_held.swap(true, Ordering::AcqRel) {
			return Err(SessionError::ConsumerAlreadyHeld);
		}
		match self.output_rx.lock().take() {
			Some(receiver) => Ok(OutputGuard {
				session: self.clone(),
				receiver: Some(receiver),
			}),
			None => {
				self.consumer_held.store(false, Ordering::Release);
				Err(SessionError::ConsumerAlreadyHeld)
			},
		}
	}

	/// Enqueues a raw JSON-RPC payload onto the output channel. Fails fast
	/// without panicking once the session is closed; otherwise suspends the
	/// caller until the single consumer drains space (callers race this
	/// against their own cancellation signal, never drop silently).
	pub async fn send_raw(&self, value: Value) -> Result<(), SessionError> {
		if self.closed.load(Ordering::Acquire) {
			return Err(SessionError::Closed);
		}
		let tx = self.output_tx.lock().clone();
		match tx {
			Some(tx) => tx.send(value).await.map_err(|_| SessionError::Closed),
			None => Err(SessionError::Closed),
		}
	}

	pub async fn send_response(&self, id: RequestId, result: Value) -> Result<(), SessionError> {
		self.send_raw(crate::jsonrpc::emit_success(id, result)).await
	}

	pub async fn send_error(&self, id: Option<RequestId>, error: RpcError) -> Result<(), SessionError> {
		self.send_raw(crate::jsonrpc::emit_error(id, error)).await
	}

	pub async fn send_notification(
		&self,
		method: &str,
		params: Option<Value>,
	) -> Result<(), SessionError> {
		self.send_raw(crate::jsonrpc::emit_notification(method, params)).await
	}

	/// Registers a server-initiated request awaiting a client response; the
	/// returned receiver resolves when [`Session::resolve_pending`] is called
	/// with a matching id, or with a synthetic error on session close.
	pub fn register_pending(
		&self,
		id: RequestId,
		deadline: Instant,
	) -> oneshot::Receiver<Result<Value, RpcError>> {
		let (tx, rx) = oneshot::channel();
		self.pending.insert(id, PendingRequest { responder: tx, deadline });
		rx
	}

	pub fn resolve_pending(&self, id: &RequestId, result: Result<Value, RpcError>) {
		if let Some((_, pending)) = self.pending.remove(id) {
			let _ = pending.responder.send(result);
		}
	}

	/// Idempotent. Transitions to Closed, fails any still-pending
	/// server-initiated requests with a synthetic error, and drops the sender
	/// half of the output channel so an active consumer observes end-of-stream.
	pub fn close(&self) {
		if self.closed.swap(true, Ordering::AcqRel) {
			return;
		}
		self.set_status(SessionStatus::Closed);
		self.output_tx.lock().take();
		let pending_ids: Vec<RequestId> = self.pending.iter().map(|e| e.key().clone()).collect();
		for id in pending_ids {
			if let Some((_, pending)) = self.pending.remove(&id) {
				let _ = pending.responder.send(Err(RpcError::internal_error("session closed")));
			}
		}
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::Acquire)
	}
}
