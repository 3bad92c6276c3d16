//! Task persistence (component C7).
//!
//! Tasks are handed to the store as owned values and handed back as deep
//! copies, so a caller mutating a loaded `Task` can never reach back into
//! the store's own copy.

use async_trait::async_trait;
use dashmap::DashMap;

use a2a_types::Task;

#[async_trait]
pub trait TaskStore: Send + Sync {
	async fn save(&self, task: Task);
	async fn load(&self, task_id: &str) -> Option<Task>;
	async fn delete(&self, task_id: &str) -> Option<Task>;
}

#[derive(Default)]
pub struct InMemoryTaskStore {
	tasks: DashMap<String, Task>,
}

impl InMemoryTaskStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
	async fn save(&self, task: Task) {
		self.tasks.insert(task.id.clone(), task);
	}

	async fn load(&self, task_id: &str) -> Option<Task> {
		self.tasks.get(task_id).map(|t| t.clone())
	}

	async fn delete(&self, task_id: &str) -> Option<Task> {
		self.tasks.remove(task_id).map(|(_, t)| t)
	}
}
