//! Durable embedding store with linear-scan matching
//!
//! Visitor counts stay small (tens to low thousands), so an O(n) scan per
//! observation is cheap and an approximate nearest-neighbor index would
//! buy nothing. The full table is held in memory and every mutation is
//! committed to the identity database before the call returns.

use crate::common::errors::{CoreError, Result};
use crate::domain::{VisitorId, VisitorIdentity};
use crate::infra::db::entities::visitor;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
	ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, DatabaseConnection,
	EntityTrait, QueryFilter, QueryOrder,
};
use tracing::{debug, info, warn};

pub struct EmbeddingStore {
	db: DatabaseConnection,
	/// All registered identities in registration order. Kept in lockstep
	/// with the `visitors` table.
	identities: Vec<VisitorIdentity>,
	similarity_threshold: f32,
}

impl EmbeddingStore {
	/// Load every registered identity from the database.
	///
	/// A row that cannot be decoded, or whose embedding does not have
	/// `expected_dim` components, fails the load: starting with a
	/// partially-loaded identity space would silently corrupt matching.
	pub async fn load(
		db: DatabaseConnection,
		similarity_threshold: f32,
		expected_dim: usize,
	) -> Result<Self> {
		let rows = visitor::Entity::find()
			.order_by_asc(visitor::Column::Id)
			.all(&db)
			.await?;

		let mut identities = Vec::with_capacity(rows.len());
		for row in rows {
			let embedding: Vec<f32> = serde_json::from_value(row.embedding).map_err(|e| {
				CoreError::CorruptIdentityTable(format!(
					"visitor {}: undecodable embedding: {e}",
					row.face_id
				))
			})?;

			if embedding.len() != expected_dim {
				return Err(CoreError::CorruptIdentityTable(format!(
					"visitor {}: embedding has {} dimensions, expected {expected_dim}",
					row.face_id,
					embedding.len()
				)));
			}

			identities.push(VisitorIdentity {
				id: VisitorId::from(row.face_id),
				reference_embedding: embedding,
				first_seen: row.first_seen,
				last_seen: row.last_seen,
			});
		}

		info!(visitors = identities.len(), "Loaded identity table");

		Ok(Self {
			db,
			identities,
			similarity_threshold,
		})
	}

	/// Find the identity whose reference embedding is closest to
	/// `embedding`, provided that distance is strictly below the
	/// configured threshold.
	///
	/// Equidistant candidates resolve to the smallest visitor id, so the
	/// result never depends on registration order.
	pub fn match_embedding(&self, embedding: &[f32]) -> Option<&VisitorIdentity> {
		let mut best: Option<(f32, &VisitorIdentity)> = None;

		for identity in &self.identities {
			let dist = euclidean(&identity.reference_embedding, embedding);
			if dist >= self.similarity_threshold {
				continue;
			}

			best = match best {
				None => Some((dist, identity)),
				Some((best_dist, best_identity)) => {
					if dist < best_dist || (dist == best_dist && identity.id < best_identity.id) {
						Some((dist, identity))
					} else {
						Some((best_dist, best_identity))
					}
				}
			};
		}

		if let Some((dist, identity)) = best {
			debug!(visitor = %identity.id, distance = dist, "Embedding matched");
		}

		best.map(|(_, identity)| identity)
	}

	/// Register a new identity for `embedding` and persist it before
	/// returning. The id is derived from the store size, so ids are
	/// allocated in a dense, monotonically increasing sequence.
	pub async fn register(&mut self, embedding: &[f32]) -> Result<VisitorIdentity> {
		let id = VisitorId::from_sequence(self.identities.len() + 1);
		let now = Utc::now();

		let identity = VisitorIdentity {
			id: id.clone(),
			reference_embedding: embedding.to_vec(),
			first_seen: now,
			last_seen: now,
		};

		visitor::ActiveModel {
			id: NotSet,
			face_id: Set(id.as_str().to_string()),
			embedding: Set(serde_json::to_value(embedding).map_err(|e| {
				CoreError::InvalidOperation(format!("unencodable embedding: {e}"))
			})?),
			first_seen: Set(now),
			last_seen: Set(now),
		}
		.insert(&self.db)
		.await?;

		info!(visitor = %id, "Registered new visitor");
		self.identities.push(identity.clone());

		Ok(identity)
	}

	/// Refresh `last_seen` for a known visitor and persist it. Unknown
	/// ids are a no-op, not an error.
	pub async fn update_last_seen(&mut self, id: &VisitorId) -> Result<()> {
		let Some(identity) = self.identities.iter_mut().find(|i| &i.id == id) else {
			warn!(visitor = %id, "update_last_seen for unknown visitor, ignoring");
			return Ok(());
		};

		let now = Utc::now();
		visitor::Entity::update_many()
			.col_expr(visitor::Column::LastSeen, Expr::value(now))
			.filter(visitor::Column::FaceId.eq(id.as_str()))
			.exec(&self.db)
			.await?;

		identity.last_seen = now;
		Ok(())
	}

	/// Number of registered identities
	pub fn count(&self) -> usize {
		self.identities.len()
	}
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
	a.iter()
		.zip(b)
		.map(|(x, y)| (x - y) * (x - y))
		.sum::<f32>()
		.sqrt()
}
