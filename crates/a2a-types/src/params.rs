use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::Message;

/// Params for `tasks/send` and `tasks/sendSubscribe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSendParams {
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
	pub message: Message,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub push_notification: Option<TaskPushNotificationConfig>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub history_length: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Value>,
}

/// Params for `tasks/get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQueryParams {
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub history_length: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Value>,
}

/// Params for `tasks/cancel`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskIdParams {
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Value>,
}

/// Params for `tasks/resubscribe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResubscriptionParams {
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub history_length: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Value>,
}

/// Opaque push-notification config accepted by `tasks/pushNotification/set`.
/// The gateway never delivers push notifications; this type exists only so
/// the method can be parsed before returning `UnsupportedOperation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPushNotificationConfig {
	pub url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authentication: Option<Value>,
}
