//! JSON-RPC 2.0 message codec (component C1).
//!
//! Parses a request body as either a single JSON-RPC object or a batch
//! array, classifying each element as a request, notification, response, or
//! error. Distinguishes "id absent" (notification) from "id present and
//! null" (used when echoing back a parse failure whose request id could not
//! be determined).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// A JSON-RPC request/response id. `String`/`Number` are kept distinct from
/// `serde_json::Value` so that round-tripping an id never accidentally
/// re-types it (e.g. a numeric id is never echoed back as a string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
	Number(i64),
	String(String),
}

impl std::fmt::Display for RequestId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			RequestId::Number(n) => write!(f, "{n}"),
			RequestId::String(s) => write!(f, "{s}"),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

impl RpcError {
	pub fn new(code: i64, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
			data: None,
		}
	}

	pub fn parse_error(message: impl Into<String>) -> Self {
		Self::new(PARSE_ERROR, message)
	}

	pub fn invalid_request(message: impl Into<String>) -> Self {
		Self::new(INVALID_REQUEST, message)
	}

	pub fn method_not_found(method: impl std::fmt::Display) -> Self {
		Self::new(METHOD_NOT_FOUND, format!("method not found: {method}"))
	}

	pub fn invalid_params(message: impl Into<String>) -> Self {
		Self::new(INVALID_PARAMS, message)
	}

	pub fn internal_error(message: impl Into<String>) -> Self {
		Self::new(INTERNAL_ERROR, message)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMessage {
	pub id: RequestId,
	pub method: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub params: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationMessage {
	pub method: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub params: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
	pub id: RequestId,
	pub result: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub id: Option<RequestId>,
	pub error: RpcError,
}

/// A single parsed JSON-RPC element. Carries a server-assigned receipt
/// timestamp, used for idle/ordering bookkeeping further up the stack.
#[derive(Debug, Clone)]
pub enum Message {
	Request(RequestMessage),
	Notification(NotificationMessage),
	Response(SuccessResponse),
	Error(ErrorResponse),
}

impl Message {
	pub fn request_id(&self) -> Option<&RequestId> {
		match self {
			Message::Request(r) => Some(&r.id),
			Message::Response(r) => Some(&r.id),
			Message::Error(r) => r.id.as_ref(),
			Message::Notification(_) => None,
		}
	}

	pub fn method(&self) -> Option<&str> {
		match self {
			Message::Request(r) => Some(&r.method),
			Message::Notification(n) => Some(&n.method),
			_ => None,
		}
	}
}

#[derive(Debug, Error)]
pub enum CodecError {
	#[error("malformed JSON: {0}")]
	Parse(String),
	#[error("invalid JSON-RPC request: {0}")]
	InvalidRequest(String),
}

impl CodecError {
	pub fn to_rpc_error(&self) -> RpcError {
		match self {
			CodecError::Parse(msg) => RpcError::parse_error(msg.clone()),
			CodecError::InvalidRequest(msg) => RpcError::invalid_request(msg.clone()),
		}
	}
}

/// Outcome of parsing one element of a (possibly batched) request body: the
/// well-formed message, or an error response already correlated to whatever
/// id (if any) could be salvaged from the malformed object.
pub type ParsedItem = Result<Message, ErrorResponse>;

/// Parses a request body as a single JSON-RPC object or a batch array.
///
/// A top-level JSON syntax error, or a body that is neither an object nor an
/// array, is a hard [`CodecError::Parse`]/[`CodecError::InvalidRequest`] — the
/// caller has no id to correlate a response to. Once the top level parses,
/// each element is classified independently: a structurally invalid element
/// inside a batch yields an `Err(ErrorResponse)` for that element alone,
/// rather than failing the whole batch.
pub fn parse(body: &[u8]) -> Result<Vec<ParsedItem>, CodecError> {
	let value: Value =
		serde_json::from_slice(body).map_err(|e| CodecError::Parse(e.to_string()))?;
	match value {
		Value::Array(items) => {
			if items.is_empty() {
				return Err(CodecError::InvalidRequest("empty batch".to_string()));
			}
			Ok(items.into_iter().map(parse_one).collect())
		},
		Value::Object(_) => Ok(vec![parse_one(value)]),
		_ => Err(CodecError::InvalidRequest(
			"body must be a JSON object or array".to_string(),
		)),
	}
}

fn parse_one(value: Value) -> ParsedItem {
	let Value::Object(mut obj) = value else {
		return Err(ErrorResponse {
			id: None,
			error: RpcError::invalid_request("element is not a JSON object"),
		});
	};

	let has_id = obj.contains_key("id");
	let id_value = obj.remove("id");
	let id = match id_value {
		Some(Value::Null) | None => None,
		Some(Value::Number(n)) => n.as_i64().map(RequestId::Number),
		Some(Value::String(s)) => Some(RequestId::String(s)),
		Some(_) => {
			return Err(ErrorResponse {
				id: None,
				error: RpcError::invalid_request("id must be a string, number, or null"),
			});
		},
	};

	let jsonrpc_ok = matches!(obj.get("jsonrpc"), Some(Value::String(v)) if v == "2.0");
	if !jsonrpc_ok {
		return Err(ErrorResponse {
			id,
			error: RpcError::invalid_request("missing or invalid \"jsonrpc\" version"),
		});
	}

	if let Some(error) = obj.remove("error") {
		let error: RpcError = match serde_json::from_value(error) {
			Ok(e) => e,
			Err(e) => {
				return Err(ErrorResponse {
					id,
					error: RpcError::invalid_request(format!("invalid error object: {e}")),
				});
			},
		};
		return Ok(Message::Error(ErrorResponse { id, error }));
	}

	if let Some(result) = obj.remove("result") {
		let Some(id) = id else {
			return Err(ErrorResponse {
				id: None,
				error: RpcError::invalid_request("response must carry an id"),
			});
		};
		return Ok(Message::Response(SuccessResponse { id, result }));
	}

	let Some(Value::String(method)) = obj.remove("method") else {
		return Err(ErrorResponse {
			id,
			error: RpcError::invalid_request("missing \"method\""),
		});
	};
	let params = obj.remove("params");

	match id {
		Some(id) if has_id => Ok(Message::Request(RequestMessage { id, method, params })),
		_ => Ok(Message::Notification(NotificationMessage { method, params })),
	}
}

pub fn emit_success(id: RequestId, result: Value) -> Value {
	serde_json::json!({
		"jsonrpc": "2.0",
		"id": id,
		"result": result,
	})
}

pub fn emit_error(id: Option<RequestId>, error: RpcError) -> Value {
	serde_json::json!({
		"jsonrpc": "2.0",
		"id": id,
		"error": error,
	})
}

pub fn emit_notification(method: &str, params: Option<Value>) -> Value {
	let mut v = serde_json::json!({
		"jsonrpc": "2.0",
		"method": method,
	});
	if let Some(params) = params {
		v["params"] = params;
	}
	v
}

pub fn emit_batch(items: Vec<Value>) -> Value {
	Value::Array(items)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_single_request() {
		let body = br#"{"jsonrpc":"2.0","id":1,"method":"ping","params":{}}"#;
		let items = parse(body).unwrap();
		assert_eq!(items.len(), 1);
		match &items[0] {
			Ok(Message::Request(r)) => {
				assert_eq!(r.id, RequestId::Number(1));
				assert_eq!(r.method, "ping");
			},
			other => panic!("expected request, got {other:?}"),
		}
	}

	#[test]
	fn notification_has_no_id() {
		let body = br#"{"jsonrpc":"2.0","method":"initialized"}"#;
		let items = parse(body).unwrap();
		match &items[0] {
			Ok(Message::Notification(n)) => assert_eq!(n.method, "initialized"),
			other => panic!("expected notification, got {other:?}"),
		}
	}

	#[test]
	fn malformed_json_is_parse_error() {
		let err = parse(b"{not json").unwrap_err();
		assert!(matches!(err, CodecError::Parse(_)));
	}

	#[test]
	fn missing_version_is_invalid_request_with_preserved_id() {
		let body = br#"{"id":5,"method":"ping"}"#;
		let items = parse(body).unwrap();
		match &items[0] {
			Err(ErrorResponse { id, error }) => {
				assert_eq!(*id, Some(RequestId::Number(5)));
				assert_eq!(error.code, INVALID_REQUEST);
			},
			other => panic!("expected error response, got {other:?}"),
		}
	}

	#[test]
	fn batch_mixes_valid_and_invalid_items() {
		let body = br#"[
			{"jsonrpc":"2.0","id":1,"method":"a"},
			{"jsonrpc":"2.0","method":"b"},
			{"not":"valid"}
		]"#;
		let items = parse(body).unwrap();
		assert_eq!(items.len(), 3);
		assert!(matches!(items[0], Ok(Message::Request(_))));
		assert!(matches!(items[1], Ok(Message::Notification(_))));
		assert!(items[2].is_err());
	}

	#[test]
	fn string_and_numeric_ids_are_not_conflated() {
		let body = br#"{"jsonrpc":"2.0","id":"7","method":"a"}"#;
		let items = parse(body).unwrap();
		match &items[0] {
			Ok(Message::Request(r)) => assert_eq!(r.id, RequestId::String("7".to_string())),
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn emit_error_with_null_id_serializes_null_not_absent() {
		let v = emit_error(None, RpcError::parse_error("bad json"));
		assert_eq!(v["id"], Value::Null);
		assert_eq!(v["error"]["code"], PARSE_ERROR);
	}

	#[test]
	fn empty_batch_is_invalid_request() {
		let err = parse(b"[]").unwrap_err();
		assert!(matches!(err, CodecError::InvalidRequest(_)));
	}
}
