use std::sync::Arc;

use clap::Parser;

use gateway::a2a::{A2aCapability, EchoHandler};
use gateway::auth::{Authenticator, InMemoryCredentialStore};
use gateway::config::{Args, GatewayConfig};
use gateway::mcp_methods::{Initialize, Ping};
use gateway::session::{InputProcessor, SessionManager};
use gateway::task_store::InMemoryTaskStore;
use gateway::transport::{build_router, AppState};
use gateway_core::version::BuildInfo;

const PROTOCOL_VERSION: &str = "2025-06-18";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	gateway::telemetry::init();

	let args = Args::parse();
	let config = GatewayConfig::load(&args)?;

	let build_info = BuildInfo::new();
	tracing::info!(version = %build_info.version, git_hash = %build_info.git_hash, "starting gateway");

	let credential_store = Arc::new(InMemoryCredentialStore::new());
	if let Some(path) = &config.credentials {
		load_credentials(&credential_store, path)?;
	}
	let authenticator = Arc::new(Authenticator::new(config.auth_policy, credential_store));

	let input = Arc::new(InputProcessor::new());
	input.register(
		"initialize",
		Arc::new(Initialize {
			server_name: "gateway".to_string(),
			server_version: build_info.version.clone(),
			protocol_version: PROTOCOL_VERSION.to_string(),
		}),
	);
	input.register("ping", Arc::new(Ping));

	let sessions = SessionManager::new(input);
	tokio::spawn(sessions.clone().run_idle_sweeper(config.idle_timeout, config.idle_timeout / 4));

	let a2a = A2aCapability::new(Arc::new(InMemoryTaskStore::new()), Arc::new(EchoHandler));

	let agent_card = Arc::new(a2a_types::AgentCard::new(
		"gateway",
		format!("http://{}/a2a", config.listen),
		build_info.version.clone(),
	));

	let state = AppState {
		sessions,
		authenticator,
		a2a,
		agent_card,
		keepalive: config.keepalive,
		response_timeout: config.response_timeout,
		mcp2025_stream_mode: config.stream_mode,
	};

	let router = build_router(state);
	let listener = tokio::net::TcpListener::bind(config.listen).await?;
	tracing::info!(addr = %config.listen, "gateway listening");
	axum::serve(listener, router).await?;
	Ok(())
}

/// Loads a flat `credential=user_id` per line file into the in-memory store.
fn load_credentials(store: &InMemoryCredentialStore, path: &std::path::Path) -> anyhow::Result<()> {
	let contents = std::fs::read_to_string(path)?;
	for line in contents.lines() {
		let line = line.trim();
		if line.is_empty() || line.starts_with('#') {
			continue;
		}
		let Some((credential, user_id)) = line.split_once('=') else {
			anyhow::bail!("malformed credentials line (expected credential=user_id): {line}");
		};
		store.insert(credential.trim(), user_id.trim());
	}
	Ok(())
}
