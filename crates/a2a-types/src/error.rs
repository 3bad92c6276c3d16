use thiserror::Error;

/// A2A-specific JSON-RPC error codes, pinned to the values used by the A2A
/// schema (outside the reserved `-32768..-32000` JSON-RPC range).
pub const TASK_NOT_FOUND: i64 = -32001;
pub const TASK_NOT_CANCELABLE: i64 = -32002;
pub const PUSH_NOTIFICATION_NOT_SUPPORTED: i64 = -32003;
pub const UNSUPPORTED_OPERATION: i64 = -32004;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum A2aError {
	#[error("task not found: {0}")]
	TaskNotFound(String),
	#[error("task cannot be canceled in its current state: {0}")]
	TaskNotCancelable(String),
	#[error("push notifications are not supported")]
	PushNotificationNotSupported,
	#[error("unsupported operation: {0}")]
	UnsupportedOperation(String),
	#[error("task already processing: {0}")]
	TaskAlreadyProcessing(String),
}

impl A2aError {
	pub fn code(&self) -> i64 {
		match self {
			A2aError::TaskNotFound(_) => TASK_NOT_FOUND,
			A2aError::TaskNotCancelable(_) => TASK_NOT_CANCELABLE,
			A2aError::PushNotificationNotSupported => PUSH_NOTIFICATION_NOT_SUPPORTED,
			A2aError::UnsupportedOperation(_) => UNSUPPORTED_OPERATION,
			// Generic JSON-RPC invalid request; this isn't a pinned A2A code.
			A2aError::TaskAlreadyProcessing(_) => -32600,
		}
	}
}
