/// Build metadata reported in the MCP `initialize` handshake and in startup logs.
#[derive(Debug, Clone)]
pub struct BuildInfo {
	pub version: String,
	pub git_hash: &'static str,
}

impl BuildInfo {
	pub fn new() -> Self {
		Self {
			version: env!("CARGO_PKG_VERSION").to_string(),
			git_hash: option_env!("GATEWAY_GIT_HASH").unwrap_or("unknown"),
		}
	}
}

impl Default for BuildInfo {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn version_is_non_empty() {
		assert!(!BuildInfo::new().version.is_empty());
	}
}
