//! Minimal MCP method handlers registered into the [`InputProcessor`] for
//! both the MCP-2024 and MCP-2025 dialects. Full tool/resource dispatch is
//! out of scope; `initialize` and `ping` are the two methods both dialects'
//! handshake and keepalive scenarios exercise.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::jsonrpc::RpcError;
use crate::session::{MethodHandler, Session};

pub struct Initialize {
	pub server_name: String,
	pub server_version: String,
	pub protocol_version: String,
}

#[async_trait]
impl MethodHandler for Initialize {
	async fn handle(&self, _session: &Arc<Session>, _params: Option<Value>) -> Result<Value, RpcError> {
		Ok(serde_json::json!({
			"protocolVersion": self.protocol_version,
			"serverInfo": {
				"name": self.server_name,
				"version": self.server_version,
			},
			"capabilities": {},
		}))
	}
}

pub struct Ping;

#[async_trait]
impl MethodHandler for Ping {
	async fn handle(&self, _session: &Arc<Session>, _params: Option<Value>) -> Result<Value, RpcError> {
		Ok(serde_json::json!({}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn initialize_reports_server_info() {
		let handler = Initialize {
			server_name: "gateway".to_string(),
			server_version: "0.1.0".to_string(),
			protocol_version: "2025-06-18".to_string(),
		};
		let session = Session::new("s1".into(), "anonymous".into(), 8);
		let result = handler.handle(&session, None).await.unwrap();
		assert_eq!(result["serverInfo"]["name"], "gateway");
	}

	#[tokio::test]
	async fn ping_returns_empty_object() {
		let session = Session::new("s1".into(), "anonymous".into(), 8);
		let result = Ping.handle(&session, None).await.unwrap();
		assert_eq!(result, serde_json::json!({}));
	}
}
