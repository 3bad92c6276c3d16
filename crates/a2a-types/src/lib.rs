//! Wire types for the Agent-to-Agent (A2A) JSON-RPC dialect.
//!
//! These mirror the `TaskSendParams`/`Task`/`Message`/`Artifact` shapes of the
//! A2A schema: a task-oriented JSON-RPC dialect layered on top of the same
//! envelope MCP uses. The generic JSON-RPC envelope (request/response/
//! notification/error, batching) lives in the `gateway` crate's `jsonrpc`
//! module since it is shared across all three dialects; this crate only
//! carries the A2A-specific params, task, and error shapes.

pub mod card;
pub mod error;
pub mod message;
pub mod params;
pub mod task;

pub use card::{AgentCapabilities, AgentCard, AgentSkill};
pub use error::A2aError;
pub use message::{Message, Part, Role};
pub use params::{
	TaskIdParams, TaskPushNotificationConfig, TaskQueryParams, TaskResubscriptionParams,
	TaskSendParams,
};
pub use task::{Artifact, Task, TaskState, TaskStatus};
