//! Durable visitor identity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for one distinct person, allocated at registration
/// and never reused. Ordering is the numeric sequence order because the
/// sequence component is zero-padded.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitorId(String);

impl VisitorId {
	/// Build the id for the `seq`-th registered visitor (1-based)
	pub fn from_sequence(seq: usize) -> Self {
		Self(format!("visitor_{seq:04}"))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for VisitorId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<String> for VisitorId {
	fn from(s: String) -> Self {
		Self(s)
	}
}

/// One registered visitor.
///
/// The reference embedding is set once at registration and never updated
/// on re-detection; `last_seen` is refreshed on every successful match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitorIdentity {
	pub id: VisitorId,
	pub reference_embedding: Vec<f32>,
	pub first_seen: DateTime<Utc>,
	pub last_seen: DateTime<Utc>,
}
