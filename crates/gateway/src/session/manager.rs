//! Session creation, lookup and idle sweeping (component C5).

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use uuid::Uuid;

use super::input::InputProcessor;
use super::session::{Session, SessionError, SessionStatus};

const DEFAULT_OUTPUT_CAPACITY: usize = 64;

pub struct SessionManager {
	sessions: DashMap<String, Arc<Session>>,
	input: Arc<InputProcessor>,
	output_capacity: usize,
}

impl SessionManager {
	pub fn new(input: Arc<InputProcessor>) -> Arc<Self> {
		Arc::new(Self {
			sessions: DashMap::new(),
			input,
			output_capacity: DEFAULT_OUTPUT_CAPACITY,
		})
	}

	pub fn input(&self) -> &Arc<InputProcessor> {
		&self.input
	}

	/// Creates a new session with a collision-free id.
	pub fn create(&self, user_id: impl Into<String>) -> Arc<Session> {
		let user_id = user_id.into();
		loop {
			let id = Uuid::new_v4().to_string();
			if self.sessions.contains_key(&id) {
				continue;
			}
			let session = Session::new(id.clone(), user_id.clone(), self.output_capacity);
			self.sessions.insert(id, session.clone());
			return session;
		}
	}

	pub fn get(&self, id: &str) -> Result<Arc<Session>, SessionError> {
		self
			.sessions
			.get(id)
			.map(|s| s.clone())
			.ok_or_else(|| SessionError::NotFound(id.to_string()))
	}

	/// Closes and forgets a session. A no-op (not an error) if it is already gone.
	pub fn close(&self, id: &str) {
		if let Some((_, session)) = self.sessions.remove(id) {
			session.close();
		}
	}

	/// Sends a notification to every session currently in `Connected` status.
	/// Keys are snapshotted under the map's internal sharded locks before any
	/// per-session send is attempted, so a slow consumer on one session never
	/// holds up delivery to the others.
	pub async fn broadcast(&self, method: &str, params: Option<serde_json::Value>) {
		let targets: Vec<Arc<Session>> = self
			.sessions
			.iter()
			.map(|e| e.value().clone())
			.filter(|s| s.status() == SessionStatus::Connected)
			.collect();
		for session in targets {
			if let Err(err) = session.send_notification(method, params.clone()).await {
				tracing::debug!(session_id = %session.id, %err, "broadcast skipped closed session");
			}
		}
	}

	/// Closes every session whose `lastActivity` is older than `idle_timeout`.
	pub fn sweep_idle(&self, idle_timeout: Duration) {
		let stale: Vec<String> = self
			.sessions
			.iter()
			.filter(|e| e.value().idle_for() > idle_timeout)
			.map(|e| e.key().clone())
			.collect();
		for id in stale {
			tracing::info!(session_id = %id, "closing idle session");
			self.close(&id);
		}
	}

	/// Runs `sweep_idle` on a fixed interval until the process shuts down.
	/// Intended to be spawned as its own task by the binary entry point.
	pub async fn run_idle_sweeper(self: Arc<Self>, idle_timeout: Duration, interval: Duration) {
		let mut ticker = tokio::time::interval(interval);
		loop {
			ticker.tick().await;
			self.sweep_idle(idle_timeout);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn manager() -> Arc<SessionManager> {
		SessionManager::new(Arc::new(InputProcessor::new()))
	}

	#[test]
	fn create_then_get_round_trips() {
		let manager = manager();
		let session = manager.create("alice");
		let found = manager.get(&session.id).unwrap();
		assert_eq!(found.user_id, "alice");
	}

	#[test]
	fn get_missing_session_errors() {
		let manager = manager();
		assert!(matches!(manager.get("nope"), Err(SessionError::NotFound(_))));
	}

	#[test]
	fn close_removes_session_from_lookup() {
		let manager = manager();
		let session = manager.create("alice");
		manager.close(&session.id);
		assert!(manager.get(&session.id).is_err());
		assert!(session.is_closed());
	}

	#[tokio::test]
	async fn broadcast_only_reaches_connected_sessions() {
		let manager = manager();
		let connected = manager.create("alice");
		connected.set_status(SessionStatus::Connecting);
		connected.set_status(SessionStatus::Connected);
		let mut connected_guard = connected.acquire_output().unwrap();

		let idle = manager.create("bob");
		idle.set_status(SessionStatus::Connecting);

		manager.broadcast("tick", None).await;

		let received = connected_guard.recv().await.unwrap();
		assert_eq!(received["method"], "tick");
	}

	#[test]
	fn sweep_idle_closes_stale_sessions_only() {
		let manager = manager();
		let session = manager.create("alice");
		manager.sweep_idle(Duration::from_secs(0));
		assert!(session.is_closed());
	}
}
