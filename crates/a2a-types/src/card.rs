use serde::{Deserialize, Serialize};

/// `/.well-known/agent.json` discovery document for an A2A-served agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCard {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	pub url: String,
	pub version: String,
	#[serde(default)]
	pub capabilities: AgentCapabilities,
	#[serde(default)]
	pub skills: Vec<AgentSkill>,
}

impl AgentCard {
	pub fn new(name: impl Into<String>, url: impl Into<String>, version: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			description: None,
			url: url.into(),
			version: version.into(),
			capabilities: AgentCapabilities::default(),
			skills: Vec::new(),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentCapabilities {
	#[serde(default)]
	pub streaming: bool,
	#[serde(default)]
	pub push_notifications: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSkill {
	pub id: String,
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default)]
	pub tags: Vec<String>,
}

impl AgentSkill {
	pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			description: None,
			tags: Vec::new(),
		}
	}
}
