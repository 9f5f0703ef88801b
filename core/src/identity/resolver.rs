//! Identity resolution over the embedding store

use crate::common::errors::Result;
use crate::domain::VisitorIdentity;
use crate::identity::EmbeddingStore;

/// Outcome of resolving one embedding
#[derive(Debug, Clone)]
pub struct Resolution {
	pub identity: VisitorIdentity,
	/// True when this observation caused a registration
	pub is_new: bool,
}

/// Turns embeddings into visitor identities.
///
/// Match and register are performed under one `&mut self` call, so two
/// unmatched embeddings of the same person can never race into two
/// identities.
pub struct IdentityResolver {
	store: EmbeddingStore,
}

impl IdentityResolver {
	pub fn new(store: EmbeddingStore) -> Self {
		Self { store }
	}

	/// Resolve `embedding` to an existing identity (refreshing its
	/// `last_seen`) or register a new one.
	pub async fn resolve(&mut self, embedding: &[f32]) -> Result<Resolution> {
		if let Some(identity) = self.store.match_embedding(embedding).cloned() {
			self.store.update_last_seen(&identity.id).await?;
			return Ok(Resolution {
				identity,
				is_new: false,
			});
		}

		let identity = self.store.register(embedding).await?;
		Ok(Resolution {
			identity,
			is_new: true,
		})
	}

	pub fn store(&self) -> &EmbeddingStore {
		&self.store
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::infra::db::migration::IdentityMigrator;
	use pretty_assertions::assert_eq;
	use sea_orm_migration::MigratorTrait;
	use tempfile::TempDir;

	async fn create_test_resolver() -> (IdentityResolver, TempDir) {
		let temp = TempDir::new().unwrap();
		let conn = crate::infra::db::connect(&temp.path().join("identities.db"))
			.await
			.unwrap();
		IdentityMigrator::up(&conn, None).await.unwrap();

		let store = EmbeddingStore::load(conn, 0.5, 2).await.unwrap();
		(IdentityResolver::new(store), temp)
	}

	#[tokio::test]
	async fn registers_then_matches() {
		let (mut resolver, _temp) = create_test_resolver().await;

		let first = resolver.resolve(&[1.0, 0.0]).await.unwrap();
		assert!(first.is_new);
		assert_eq!(first.identity.id.as_str(), "visitor_0001");

		let second = resolver.resolve(&[1.0, 0.0]).await.unwrap();
		assert!(!second.is_new);
		assert_eq!(second.identity.id, first.identity.id);
		assert_eq!(resolver.store().count(), 1);
	}

	#[tokio::test]
	async fn distant_embeddings_get_distinct_identities() {
		let (mut resolver, _temp) = create_test_resolver().await;

		let a = resolver.resolve(&[1.0, 0.0]).await.unwrap();
		let b = resolver.resolve(&[0.0, 1.0]).await.unwrap();

		assert!(a.is_new && b.is_new);
		assert_ne!(a.identity.id, b.identity.id);
		assert_eq!(resolver.store().count(), 2);
	}
}
