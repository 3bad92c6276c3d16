//! A2A task state machine (component C8) — the heart of the core.
//!
//! Registers the `tasks/*` method family, runs agent handlers on dedicated
//! workers, and translates their yields into task-state mutations and SSE
//! events per the A2A task state machine and its edge-case policies.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use a2a_types::{
	Artifact, Message, Task, TaskIdParams, TaskQueryParams, TaskResubscriptionParams,
	TaskSendParams, TaskState,
};

use crate::jsonrpc::RpcError;
use crate::task_store::TaskStore;

use super::handler::{AgentHandler, Yield};

/// One update delivered to an SSE subscriber of `tasks/sendSubscribe`.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TaskUpdateEvent {
	#[serde(rename = "status")]
	Status {
		task_id: String,
		status: a2a_types::TaskStatus,
		#[serde(rename = "final")]
		is_final: bool,
	},
	#[serde(rename = "artifact")]
	Artifact { task_id: String, artifact: Artifact },
}

pub struct A2aCapability {
	store: Arc<dyn TaskStore>,
	handler: Arc<dyn AgentHandler>,
	cancel_fns: DashMap<String, CancellationToken>,
	running: DashMap<String, ()>,
}

impl A2aCapability {
	pub fn new(store: Arc<dyn TaskStore>, handler: Arc<dyn AgentHandler>) -> Arc<Self> {
		Arc::new(Self {
			store,
			handler,
			cancel_fns: DashMap::new(),
			running: DashMap::new(),
		})
	}

	/// `tasks/send`: runs the handler and blocks until the task reaches
	/// InputRequired, a terminal state, or an error.
	pub async fn send(&self, params: TaskSendParams) -> Result<Value, RpcError> {
		let task = self.start_or_restart(&params).await?;
		let (tx, mut rx) = mpsc::channel(64);
		let cancel = CancellationToken::new();
		self.cancel_fns.insert(params.id.clone(), cancel.clone());
		self.running.insert(params.id.clone(), ());

		let handler = self.handler.clone();
		let task_id = params.id.clone();
		let message = params.message.clone();
		let worker = tokio::spawn(async move { handler.handle(task_id, message, tx, cancel).await });

		let mut current = task;
		let mut early_error = None;
		while let Some(update) = rx.recv().await {
			if let Yield::Error(err) = &update {
				early_error = Some(err.clone());
			}
			current = apply_yield(current, update);
			if should_save_intermediate(&current) {
				self.store.save(current.clone()).await;
			}
			if current.is_terminal() || current.status.state == TaskState::InputRequired {
				break;
			}
		}
		// Drain remaining queued yields so the worker's final output is never lost.
		while let Ok(update) = rx.try_recv() {
			current = apply_yield(current, update);
		}

		let outcome = worker.await;
		let canceled = cancel.is_cancelled();
		self.cancel_fns.remove(&params.id);
		self.running.remove(&params.id);
		current = finalize(current, outcome, canceled);
		self.store.save(current.clone()).await;

		if let Some(err) = early_error {
			return Err(err);
		}
		if current.status.state == TaskState::Failed {
			return Err(RpcError::internal_error("agent handler failed"));
		}
		serde_json::to_value(current.with_history_length(params.history_length))
			.map_err(|e| RpcError::internal_error(e.to_string()))
	}

	/// `tasks/sendSubscribe`: returns the initial snapshot synchronously and
	/// drives the handler on a background worker, emitting events to `events`
	/// until a final status is reached.
	pub async fn send_subscribe(
		self: &Arc<Self>,
		params: TaskSendParams,
		events: mpsc::Sender<TaskUpdateEvent>,
	) -> Result<Value, RpcError> {
		let task = self.start_or_restart(&params).await?;
		let snapshot = strip_artifacts(task.clone().with_history_length(params.history_length));
		let snapshot =
			serde_json::to_value(snapshot).map_err(|e| RpcError::internal_error(e.to_string()))?;

		let (tx, mut rx) = mpsc::channel(64);
		let cancel = CancellationToken::new();
		self.cancel_fns.insert(params.id.clone(), cancel.clone());
		self.running.insert(params.id.clone(), ());

		let capability = self.clone();
		let task_id = params.id.clone();
		let message = params.message;

		tokio::spawn(async move {
			let handler = capability.handler.clone();
			let worker = tokio::spawn({
				let task_id = task_id.clone();
				let cancel = cancel.clone();
				async move { handler.handle(task_id, message, tx, cancel).await }
			});

			let mut current = task;
			while let Some(update) = rx.recv().await {
				current = apply_yield(current, update.clone());
				emit_event(&events, &task_id, &current, &update).await;
				if should_save_intermediate(&current) {
					capability.store.save(current.clone()).await;
				}
			}
			while let Ok(update) = rx.try_recv() {
				current = apply_yield(current, update);
			}

			let outcome = worker.await;
			let canceled = cancel.is_cancelled();
			current = finalize(current, outcome, canceled);
			capability.store.save(current.clone()).await;
			capability.cancel_fns.remove(&task_id);
			capability.running.remove(&task_id);

			let _ = events
				.send(TaskUpdateEvent::Status {
					task_id,
					status: current.status,
					is_final: true,
				})
				.await;
		});

		Ok(snapshot)
	}

	pub async fn get(&self, params: TaskQueryParams) -> Result<Value, RpcError> {
		let task = self.load_or_not_found(&params.id).await?;
		serde_json::to_value(task.with_history_length(params.history_length))
			.map_err(|e| RpcError::internal_error(e.to_string()))
	}

	/// `tasks/cancel`: transitions a non-terminal task to Canceled. A missing
	/// cancel-function entry is logged but the task is still marked Canceled
	/// (the handler may have just finished on its own).
	pub async fn cancel(&self, params: TaskIdParams) -> Result<Value, RpcError> {
		let mut task = self.load_or_not_found(&params.id).await?;

		if task.is_terminal() {
			return Err(RpcError::new(
				a2a_types::error::TASK_NOT_CANCELABLE,
				format!("task {} is already in a terminal state", params.id),
			));
		}

		if let Some((_, cancel)) = self.cancel_fns.remove(&params.id) {
			cancel.cancel();
		} else {
			tracing::warn!(task_id = %params.id, "cancel requested with no running handler; marking canceled anyway");
		}

		task.status = a2a_types::TaskStatus::new(TaskState::Canceled);
		self.store.save(task.clone()).await;
		serde_json::to_value(task).map_err(|e| RpcError::internal_error(e.to_string()))
	}

	pub fn push_notification_unsupported(&self) -> RpcError {
		RpcError::new(a2a_types::error::UNSUPPORTED_OPERATION, "push notifications are not supported")
	}

	/// `tasks/resubscribe`: returns a snapshot only. Updates from a still-
	/// running handler are NOT routed to a resubscribing stream; the task
	/// store keeps latest state, not a replayable event log.
	pub async fn resubscribe(&self, params: TaskResubscriptionParams) -> Result<Value, RpcError> {
		let task = self.load_or_not_found(&params.id).await?;
		serde_json::to_value(task.with_history_length(params.history_length))
			.map_err(|e| RpcError::internal_error(e.to_string()))
	}

	async fn load_or_not_found(&self, task_id: &str) -> Result<Task, RpcError> {
		self.store.load(task_id).await.ok_or_else(|| {
			RpcError::new(a2a_types::error::TASK_NOT_FOUND, format!("task not found: {task_id}"))
		})
	}

	async fn start_or_restart(&self, params: &TaskSendParams) -> Result<Task, RpcError> {
		if self.running.contains_key(&params.id) {
			return Err(RpcError::invalid_request(format!("task {} already processing", params.id)));
		}

		match self.store.load(&params.id).await {
			Some(mut task) if task.is_terminal() => {
				task.status = a2a_types::TaskStatus::new(TaskState::Submitted);
				task.artifacts = None;
				task.push_history(params.message.clone());
				task.session_id = params.session_id.clone().or(task.session_id);
				Ok(task)
			},
			Some(mut task) if task.status.state == TaskState::InputRequired => {
				task.status = a2a_types::TaskStatus::new(TaskState::Submitted);
				task.push_history(params.message.clone());
				Ok(task)
			},
			Some(task) => Err(RpcError::invalid_request(format!("task {} already processing", task.id))),
			None => {
				let mut task = Task::new(params.id.clone(), params.session_id.clone());
				task.push_history(params.message.clone());
				Ok(task)
			},
		}
	}
}

fn strip_artifacts(mut task: Task) -> Task {
	task.artifacts = None;
	task
}

fn should_save_intermediate(task: &Task) -> bool {
	task.status.state == TaskState::InputRequired || task.is_terminal()
}

fn apply_yield(mut task: Task, update: Yield) -> Task {
	match update {
		Yield::Status { state, message } => {
			if let Some(message) = message {
				task.push_history(message.clone());
				task.status = a2a_types::TaskStatus::with_message(state, message);
			} else {
				task.status = a2a_types::TaskStatus::new(state);
			}
		},
		Yield::Artifact(artifact) => merge_artifact(&mut task, artifact),
		Yield::Error(err) => {
			task.status =
				a2a_types::TaskStatus::with_message(TaskState::Failed, Message::agent(err.message));
		},
	}
	task
}

fn merge_artifact(task: &mut Task, artifact: Artifact) {
	let artifacts = task.artifacts.get_or_insert_with(Vec::new);
	match artifacts.iter_mut().find(|a| a.index == artifact.index) {
		Some(existing) if artifact.append == Some(true) => {
			existing.parts.extend(artifact.parts);
			existing.last_chunk = artifact.last_chunk;
			if artifact.name.is_some() {
				existing.name = artifact.name;
			}
			if artifact.description.is_some() {
				existing.description = artifact.description;
			}
		},
		Some(existing) => *existing = artifact,
		None => artifacts.push(artifact),
	}
}

/// Synthesizes a terminal status once the worker finishes. `canceled`
/// reflects `CancellationToken::is_cancelled()` at the time the worker
/// returned: only a canceled token turns a handler error into `Canceled`,
/// everything else is `Failed` (the client sees a generic InternalError;
/// the real cause goes to the log).
fn finalize(
	mut task: Task,
	outcome: Result<Result<(), anyhow::Error>, tokio::task::JoinError>,
	canceled: bool,
) -> Task {
	if task.is_terminal() || task.status.state == TaskState::InputRequired {
		return task;
	}
	match outcome {
		Ok(Ok(())) => {
			task.status = a2a_types::TaskStatus::new(TaskState::Completed);
		},
		Ok(Err(err)) if canceled => {
			tracing::info!(task_id = %task.id, %err, "agent handler exited after cancellation");
			task.status = a2a_types::TaskStatus::new(TaskState::Canceled);
		},
		Ok(Err(err)) => {
			tracing::warn!(task_id = %task.id, %err, "agent handler returned an error");
			task.status = a2a_types::TaskStatus::new(TaskState::Failed);
		},
		Err(join_err) => {
			tracing::error!(task_id = %task.id, %join_err, "agent handler worker panicked");
			task.status = a2a_types::TaskStatus::new(TaskState::Failed);
		},
	}
	task
}

async fn emit_event(
	events: &mpsc::Sender<TaskUpdateEvent>,
	task_id: &str,
	task: &Task,
	update: &Yield,
) {
	let event = match update {
		Yield::Status { .. } | Yield::Error(_) => TaskUpdateEvent::Status {
			task_id: task_id.to_string(),
			status: task.status.clone(),
			is_final: task.is_terminal(),
		},
		Yield::Artifact(artifact) => TaskUpdateEvent::Artifact {
			task_id: task_id.to_string(),
			artifact: artifact.clone(),
		},
	};
	let _ = events.send(event).await;
}
