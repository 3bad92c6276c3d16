//! Credential verification (component C2).
//!
//! Policy-driven gate in front of session creation: depending on
//! [`AuthPolicy`], a connecting client must present a credential that hashes
//! to a known record, or is let through anonymously. Credentials are never
//! compared or stored in the clear — only their SHA-256 digest crosses into
//! the store.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Controls whether a credential is required to open a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
	/// Every connection must present a valid credential.
	RequiredEverywhere,
	/// Valid credential required, except on routes marked exempt by the caller.
	RequiredExceptMarked,
	/// No credential is ever required; a presented one is still verified if given.
	NotRequiredEverywhere,
	/// No credential required except on routes marked as needing one.
	NotRequiredOnlyMarked,
}

#[derive(Debug, Clone)]
pub struct UserRecord {
	pub user_id: String,
}

/// Backing store for credential hash lookups. Implementations must treat the
/// hash as opaque.
#[async_trait]
pub trait CredentialStore: Send + Sync {
	async fn lookup(&self, credential_hash: &[u8]) -> Option<UserRecord>;
}

/// In-memory credential store keyed by SHA-256 digest of the raw credential.
#[derive(Default)]
pub struct InMemoryCredentialStore {
	records: DashMap<Vec<u8>, UserRecord>,
}

impl InMemoryCredentialStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, credential: &str, user_id: impl Into<String>) {
		self.records.insert(hash_credential(credential), UserRecord { user_id: user_id.into() });
	}
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
	async fn lookup(&self, credential_hash: &[u8]) -> Option<UserRecord> {
		// Plain hash-equality lookup keyed on the digest; no constant-time
		// comparison is performed anywhere in this path.
		self.records.get(credential_hash).map(|r| r.clone())
	}
}

fn hash_credential(credential: &str) -> Vec<u8> {
	let mut hasher = Sha256::new();
	hasher.update(credential.as_bytes());
	hasher.finalize().to_vec()
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
	#[error("credential required")]
	CredentialRequired,
	#[error("credential rejected")]
	CredentialRejected,
}

pub struct Authenticator {
	policy: AuthPolicy,
	store: Arc<dyn CredentialStore>,
}

impl Authenticator {
	pub fn new(policy: AuthPolicy, store: Arc<dyn CredentialStore>) -> Self {
		Self { policy, store }
	}

	/// Verifies `credential` against the configured policy. `route_marked`
	/// reflects whether the connecting route opted in (or out) of the
	/// exemption the policy allows; it is ignored by the two "everywhere"
	/// policies. Returns the authenticated user id, or `"anonymous"` when the
	/// policy allows an unauthenticated session.
	pub async fn authenticate(
		&self,
		credential: Option<&str>,
		route_marked: bool,
	) -> Result<String, AuthError> {
		let required = match self.policy {
			AuthPolicy::RequiredEverywhere => true,
			AuthPolicy::RequiredExceptMarked => !route_marked,
			AuthPolicy::NotRequiredEverywhere => false,
			AuthPolicy::NotRequiredOnlyMarked => route_marked,
		};

		match credential {
			Some(cred) => {
				let hash = hash_credential(cred);
				match self.store.lookup(&hash).await {
					Some(record) => Ok(record.user_id),
					None if required => Err(AuthError::CredentialRejected),
					None => Ok("anonymous".to_string()),
				}
			},
			None if required => Err(AuthError::CredentialRequired),
			None => Ok("anonymous".to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn store_with(credential: &str, user: &str) -> Arc<InMemoryCredentialStore> {
		let store = InMemoryCredentialStore::new();
		store.insert(credential, user);
		Arc::new(store)
	}

	#[tokio::test]
	async fn required_everywhere_rejects_missing_credential() {
		let auth = Authenticator::new(AuthPolicy::RequiredEverywhere, store_with("secret", "alice"));
		let err = auth.authenticate(None, false).await.unwrap_err();
		assert_eq!(err, AuthError::CredentialRequired);
	}

	#[tokio::test]
	async fn required_everywhere_accepts_known_credential() {
		let auth = Authenticator::new(AuthPolicy::RequiredEverywhere, store_with("secret", "alice"));
		let user = auth.authenticate(Some("secret"), false).await.unwrap();
		assert_eq!(user, "alice");
	}

	#[tokio::test]
	async fn required_everywhere_rejects_unknown_credential() {
		let auth = Authenticator::new(AuthPolicy::RequiredEverywhere, store_with("secret", "alice"));
		let err = auth.authenticate(Some("wrong"), false).await.unwrap_err();
		assert_eq!(err, AuthError::CredentialRejected);
	}

	#[tokio::test]
	async fn not_required_everywhere_allows_anonymous() {
		let auth =
			Authenticator::new(AuthPolicy::NotRequiredEverywhere, store_with("secret", "alice"));
		let user = auth.authenticate(None, false).await.unwrap();
		assert_eq!(user, "anonymous");
	}

	#[tokio::test]
	async fn required_except_marked_exempts_marked_route() {
		let auth =
			Authenticator::new(AuthPolicy::RequiredExceptMarked, store_with("secret", "alice"));
		let user = auth.authenticate(None, true).await.unwrap();
		assert_eq!(user, "anonymous");
		let err = auth.authenticate(None, false).await.unwrap_err();
		assert_eq!(err, AuthError::CredentialRequired);
	}

	#[tokio::test]
	async fn not_required_only_marked_requires_on_marked_route() {
		let auth =
			Authenticator::new(AuthPolicy::NotRequiredOnlyMarked, store_with("secret", "alice"));
		let err = auth.authenticate(None, true).await.unwrap_err();
		assert_eq!(err, AuthError::CredentialRequired);
		let user = auth.authenticate(None, false).await.unwrap();
		assert_eq!(user, "anonymous");
	}
}
