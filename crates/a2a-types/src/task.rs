use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::{Message, Part};

/// A task's position in the A2A state machine. Terminal states are
/// `Completed`, `Failed` and `Canceled`; they are absorbing except for an
/// explicit user-message restart out of `InputRequired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
	Submitted,
	Working,
	InputRequired,
	Completed,
	Failed,
	Canceled,
}

impl TaskState {
	pub fn is_terminal(self) -> bool {
		matches!(self, TaskState::Completed | TaskState::Failed | TaskState::Canceled)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
	pub state: TaskState,
	pub timestamp: DateTime<Utc>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<Message>,
}

impl TaskStatus {
	pub fn new(state: TaskState) -> Self {
		Self {
			state,
			timestamp: Utc::now(),
			message: None,
		}
	}

	pub fn with_message(state: TaskState, message: Message) -> Self {
		Self {
			state,
			timestamp: Utc::now(),
			message: Some(message),
		}
	}
}

/// A named, possibly-partial chunk of task output. `append`/`last_chunk`
/// govern how a handler's successive yields are merged onto the indexed
/// slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
	pub index: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	pub parts: Vec<Part>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub append: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_chunk: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
	pub status: TaskStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub artifacts: Option<Vec<Artifact>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub history: Option<Vec<Message>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Value>,
}

impl Task {
	pub fn new(id: impl Into<String>, session_id: Option<String>) -> Self {
		Self {
			id: id.into(),
			session_id,
			status: TaskStatus::new(TaskState::Submitted),
			artifacts: None,
			history: None,
			metadata: None,
		}
	}

	pub fn is_terminal(&self) -> bool {
		self.status.state.is_terminal()
	}

	pub fn push_history(&mut self, message: Message) {
		self.history.get_or_insert_with(Vec::new).push(message);
	}

	/// Returns a copy with `history` trimmed to the last `n` entries, as
	/// required when serving `tasks/get`/`tasks/send` responses with a
	/// `historyLength` request parameter.
	pub fn with_history_length(mut self, n: Option<u32>) -> Self {
		match (n, self.history.take()) {
			(Some(n), Some(mut h)) => {
				let n = n as usize;
				if h.len() > n {
					h.drain(0..h.len() - n);
				}
				self.history = Some(h);
			},
			(None, _) => self.history = None,
			(Some(_), None) => {},
		}
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn terminal_states_are_absorbing_by_flag() {
		assert!(TaskState::Completed.is_terminal());
		assert!(TaskState::Failed.is_terminal());
		assert!(TaskState::Canceled.is_terminal());
		assert!(!TaskState::Working.is_terminal());
		assert!(!TaskState::InputRequired.is_terminal());
		assert!(!TaskState::Submitted.is_terminal());
	}

	#[test]
	fn history_length_trims_oldest_first() {
		let mut t = Task::new("t1", None);
		for i in 0..5 {
			t.push_history(Message::user(format!("msg{i}")));
		}
		let trimmed = t.with_history_length(Some(2));
		let h = trimmed.history.unwrap();
		assert_eq!(h.len(), 2);
		assert_eq!(h[0].first_text(), Some("msg3"));
		assert_eq!(h[1].first_text(), Some("msg4"));
	}

	#[test]
	fn no_history_length_drops_history() {
		let mut t = Task::new("t1", None);
		t.push_history(Message::user("hi"));
		let trimmed = t.with_history_length(None);
		assert!(trimmed.history.is_none());
	}
}
