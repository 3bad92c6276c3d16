use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a [`Message`] in a task's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	User,
	Agent,
}

/// A single content part of a message or artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
	Text {
		text: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		metadata: Option<Value>,
	},
	Data {
		data: Value,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		metadata: Option<Value>,
	},
	File {
		file: FileContent,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		metadata: Option<Value>,
	},
}

impl Part {
	pub fn text(text: impl Into<String>) -> Self {
		Part::Text {
			text: text.into(),
			metadata: None,
		}
	}

	/// Returns the inline text, if this part is a text part.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Part::Text { text, .. } => Some(text),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mime_type: Option<String>,
	/// Exactly one of `bytes` (base64) or `uri` must be set; not enforced at
	/// the type level since both the gateway and the remote agent only ever
	/// construct these programmatically.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bytes: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub uri: Option<String>,
}

/// A user or agent message, either carried in a request or recorded in a
/// task's `history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
	pub role: Role,
	pub parts: Vec<Part>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Value>,
}

impl Message {
	pub fn user(text: impl Into<String>) -> Self {
		Message {
			role: Role::User,
			parts: vec![Part::text(text)],
			metadata: None,
		}
	}

	pub fn agent(text: impl Into<String>) -> Self {
		Message {
			role: Role::Agent,
			parts: vec![Part::text(text)],
			metadata: None,
		}
	}

	pub fn first_text(&self) -> Option<&str> {
		self.parts.iter().find_map(Part::as_text)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_through_json() {
		let msg = Message::user("need_input");
		let raw = serde_json::to_string(&msg).unwrap();
		let back: Message = serde_json::from_str(&raw).unwrap();
		assert_eq!(msg, back);
	}

	#[test]
	fn as_text_ignores_non_text_parts() {
		let part = Part::Data {
			data: serde_json::json!({"a": 1}),
			metadata: None,
		};
		assert_eq!(part.as_text(), None);
	}
}
