use thiserror::Error;

use crate::jsonrpc::RpcError;

/// Top-level error type threaded through the transport layer. Individual
/// components (codec, auth, session, a2a) define their own narrower error
/// enums; this type is the seam where they get mapped onto an HTTP response
/// or a JSON-RPC error object.
#[derive(Debug, Error)]
pub enum GatewayError {
	#[error("transport error: {0}")]
	Transport(#[from] crate::transport::TransportError),
	#[error(transparent)]
	Codec(#[from] crate::jsonrpc::CodecError),
	#[error(transparent)]
	Auth(#[from] crate::auth::AuthError),
	#[error(transparent)]
	Session(#[from] crate::session::SessionError),
	#[error(transparent)]
	A2a(#[from] a2a_types::A2aError),
	#[error("internal error: {0}")]
	Internal(String),
}

impl GatewayError {
	/// Maps this error onto a JSON-RPC error object for protocol-level
	/// failures (unknown method, bad params, missing session, ...). Transport
	/// errors are not mapped here; they short-circuit to a plain HTTP status
	/// before a JSON-RPC body would ever be written.
	pub fn to_rpc_error(&self) -> RpcError {
		match self {
			GatewayError::Codec(e) => e.to_rpc_error(),
			GatewayError::Auth(_) => RpcError::invalid_request("authentication failed"),
			GatewayError::Session(e) => RpcError::invalid_request(e.to_string()),
			GatewayError::A2a(e) => RpcError::new(e.code(), e.to_string()),
			GatewayError::Internal(msg) => RpcError::internal_error(msg.clone()),
			GatewayError::Transport(e) => RpcError::internal_error(e.to_string()),
		}
	}
}
