//! Layered configuration: CLI flags override environment variables, which
//! override an optional TOML file, which falls back to hardcoded defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use crate::auth::AuthPolicy;
use crate::transport::Mcp2025StreamMode;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to load configuration: {0}")]
	Load(#[from] config::ConfigError),
	#[error("invalid auth policy {0:?}, expected one of: required, required-except-marked, not-required, not-required-only-marked")]
	InvalidAuthPolicy(String),
	#[error("invalid stream mode {0:?}, expected \"json\" or \"sse\"")]
	InvalidStreamMode(String),
	#[error("invalid listen address {0:?}")]
	InvalidListenAddress(String),
}

/// Raw, pre-validation shape deserialized from file/env. Kept distinct from
/// [`GatewayConfig`] so defaulting and validation happen in one place instead
/// of scattered across `serde(default = ...)` attributes.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
struct RawConfig {
	listen: Option<String>,
	credentials: Option<PathBuf>,
	auth_policy: Option<String>,
	idle_timeout_secs: Option<u64>,
	response_timeout_secs: Option<u64>,
	keepalive_secs: Option<u64>,
	stream_mode: Option<String>,
}

/// Command-line surface. Any flag set here wins over env/file, matching the
/// teacher's layered precedence (file -> env -> explicit override).
#[derive(Debug, Parser)]
#[command(name = "gateway-server", about = "Protocol gateway for MCP-2024, MCP-2025 and A2A")]
pub struct Args {
	/// Optional TOML config file, merged beneath env vars and CLI flags.
	#[arg(long)]
	pub config: Option<PathBuf>,

	#[arg(long, env = "GATEWAY_LISTEN")]
	pub listen: Option<String>,

	#[arg(long, env = "GATEWAY_CREDENTIALS")]
	pub credentials: Option<PathBuf>,

	#[arg(long, env = "GATEWAY_AUTH_POLICY")]
	pub auth_policy: Option<String>,

	#[arg(long, env = "GATEWAY_IDLE_TIMEOUT_SECS")]
	pub idle_timeout_secs: Option<u64>,

	#[arg(long, env = "GATEWAY_RESPONSE_TIMEOUT_SECS")]
	pub response_timeout_secs: Option<u64>,

	#[arg(long, env = "GATEWAY_KEEPALIVE_SECS")]
	pub keepalive_secs: Option<u64>,

	/// Whether `/mcp` POST responses that expect output stream over SSE or
	/// return a single JSON body. Server-wide, not negotiated per request.
	#[arg(long, env = "GATEWAY_STREAM_MODE")]
	pub stream_mode: Option<String>,
}

/// Validated runtime configuration, ready to construct the gateway's state.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
	pub listen: SocketAddr,
	pub credentials: Option<PathBuf>,
	pub auth_policy: AuthPolicy,
	pub idle_timeout: Duration,
	pub response_timeout: Duration,
	pub keepalive: Duration,
	pub stream_mode: Mcp2025StreamMode,
}

impl Default for GatewayConfig {
	fn default() -> Self {
		Self {
			listen: "127.0.0.1:8080".parse().expect("valid default listen address"),
			credentials: None,
			auth_policy: AuthPolicy::NotRequiredEverywhere,
			idle_timeout: Duration::from_secs(300),
			response_timeout: Duration::from_secs(30),
			keepalive: Duration::from_secs(15),
			stream_mode: Mcp2025StreamMode::Json,
		}
	}
}

impl GatewayConfig {
	/// Builds the layered config: defaults, then an optional TOML file, then
	/// environment variables prefixed `GATEWAY_`, then explicit CLI flags.
	pub fn load(args: &Args) -> Result<Self, ConfigError> {
		let mut builder = config::Config::builder();
		if let Some(path) = &args.config {
			builder = builder.add_source(config::File::from(path.as_path()));
		}
		builder = builder.add_source(config::Environment::with_prefix("GATEWAY").separator("_"));
		let raw: RawConfig = builder.build()?.try_deserialize().unwrap_or_default();

		let mut cfg = GatewayConfig::default();

		if let Some(listen) = args.listen.clone().or(raw.listen) {
			cfg.listen = listen.parse().map_err(|_| ConfigError::InvalidListenAddress(listen))?;
		}
		cfg.credentials = args.credentials.clone().or(raw.credentials);
		if let Some(policy) = args.auth_policy.clone().or(raw.auth_policy) {
			cfg.auth_policy = parse_auth_policy(&policy)?;
		}
		if let Some(secs) = args.idle_timeout_secs.or(raw.idle_timeout_secs) {
			cfg.idle_timeout = Duration::from_secs(secs);
		}
		if let Some(secs) = args.response_timeout_secs.or(raw.response_timeout_secs) {
			cfg.response_timeout = Duration::from_secs(secs);
		}
		if let Some(secs) = args.keepalive_secs.or(raw.keepalive_secs) {
			cfg.keepalive = Duration::from_secs(secs);
		}
		if let Some(mode) = args.stream_mode.clone().or(raw.stream_mode) {
			cfg.stream_mode = parse_stream_mode(&mode)?;
		}

		Ok(cfg)
	}
}

fn parse_auth_policy(s: &str) -> Result<AuthPolicy, ConfigError> {
	match s {
		"required" => Ok(AuthPolicy::RequiredEverywhere),
		"required-except-marked" => Ok(AuthPolicy::RequiredExceptMarked),
		"not-required" => Ok(AuthPolicy::NotRequiredEverywhere),
		"not-required-only-marked" => Ok(AuthPolicy::NotRequiredOnlyMarked),
		other => Err(ConfigError::InvalidAuthPolicy(other.to_string())),
	}
}

fn parse_stream_mode(s: &str) -> Result<Mcp2025StreamMode, ConfigError> {
	match s {
		"json" => Ok(Mcp2025StreamMode::Json),
		"sse" => Ok(Mcp2025StreamMode::Sse),
		other => Err(ConfigError::InvalidStreamMode(other.to_string())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn bare_args() -> Args {
		Args {
			config: None,
			listen: None,
			credentials: None,
			auth_policy: None,
			idle_timeout_secs: None,
			response_timeout_secs: None,
			keepalive_secs: None,
			stream_mode: None,
		}
	}

	#[test]
	fn defaults_apply_with_no_overrides() {
		let cfg = GatewayConfig::load(&bare_args()).unwrap();
		assert_eq!(cfg.auth_policy, AuthPolicy::NotRequiredEverywhere);
		assert_eq!(cfg.keepalive, Duration::from_secs(15));
	}

	#[test]
	fn cli_flag_overrides_default() {
		let mut args = bare_args();
		args.auth_policy = Some("required".to_string());
		args.keepalive_secs = Some(5);
		let cfg = GatewayConfig::load(&args).unwrap();
		assert_eq!(cfg.auth_policy, AuthPolicy::RequiredEverywhere);
		assert_eq!(cfg.keepalive, Duration::from_secs(5));
	}

	#[test]
	fn unknown_auth_policy_is_rejected() {
		let mut args = bare_args();
		args.auth_policy = Some("bogus".to_string());
		assert!(GatewayConfig::load(&args).is_err());
	}
}
