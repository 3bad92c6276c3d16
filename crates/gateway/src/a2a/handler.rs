//! Agent handler contract (component C9).
//!
//! A handler is a cooperative, cancellable producer of task updates: a
//! `tokio_util::sync::CancellationToken` signals cancellation, and a bounded
//! `mpsc::Sender<Yield>` carries status and artifact updates back to the
//! capability that owns the task.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use a2a_types::{Artifact, Message, TaskState};

use crate::jsonrpc::RpcError;

/// One update produced by a running handler.
#[derive(Debug, Clone)]
pub enum Yield {
	Status {
		state: TaskState,
		message: Option<Message>,
	},
	Artifact(Artifact),
	/// A client-facing, JSON-RPC-shaped failure. Distinguished from an
	/// `Err` return from `handle` itself, which is treated as an opaque
	/// internal error.
	Error(RpcError),
}

/// Implemented by whatever executes the actual agent work for a task.
/// The handler MUST NOT close `updates` (owned by the capability) and MUST
/// NOT retain or mutate `task` after yielding; it receives a fresh snapshot
/// on restart.
#[async_trait]
pub trait AgentHandler: Send + Sync {
	async fn handle(
		&self,
		task_id: String,
		message: Message,
		updates: mpsc::Sender<Yield>,
		cancel: CancellationToken,
	) -> Result<(), anyhow::Error>;
}

/// A minimal handler used in tests and as a runnable default: answers with a
/// single text artifact unless the message asks for input.
pub struct EchoHandler;

#[async_trait]
impl AgentHandler for EchoHandler {
	async fn handle(
		&self,
		_task_id: String,
		message: Message,
		updates: mpsc::Sender<Yield>,
		cancel: CancellationToken,
	) -> Result<(), anyhow::Error> {
		let text = message.first_text().unwrap_or_default().to_string();

		updates
			.send(Yield::Status { state: TaskState::Working, message: None })
			.await
			.ok();

		if text.contains("need_input") {
			updates
				.send(Yield::Status {
					state: TaskState::InputRequired,
					message: Some(Message::agent("what else do you need?")),
				})
				.await
				.ok();
			return Ok(());
		}

		tokio::select! {
			_ = cancel.cancelled() => {
				anyhow::bail!("canceled");
			}
			_ = tokio::time::sleep(std::time::Duration::from_millis(1)) => {}
		}

		let artifact = Artifact {
			index: 0,
			name: Some("response.txt".to_string()),
			description: None,
			parts: vec![a2a_types::Part::text(format!("echo: {text}"))],
			metadata: None,
			append: None,
			last_chunk: Some(true),
		};
		updates.send(Yield::Artifact(artifact)).await.ok();
		updates
			.send(Yield::Status { state: TaskState::Completed, message: None })
			.await
			.ok();
		Ok(())
	}
}
