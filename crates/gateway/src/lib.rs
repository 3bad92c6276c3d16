//! Protocol gateway and agent runtime.
//!
//! Multiplexes JSON-RPC 2.0 traffic between clients and backend agent
//! handlers across three wire dialects: MCP-2024 (SSE `endpoint` event
//! pattern), MCP-2025 (unified POST-or-stream endpoint), and A2A
//! (task-oriented, optionally streaming).

pub mod a2a;
pub mod auth;
pub mod config;
pub mod error;
pub mod jsonrpc;
pub mod mcp_methods;
pub mod session;
pub mod task_store;
pub mod telemetry;
pub mod transport;

pub use error::GatewayError;
