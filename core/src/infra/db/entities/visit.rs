//! Visit event entity
//!
//! Append-only; rows are never updated or deleted. The autoincrement id
//! doubles as the deterministic tiebreak for same-timestamp ordering.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "visits")]
pub struct Model {
	#[sea_orm(primary_key)]
	#[serde(default)]
	pub id: i32,

	pub face_id: String,

	/// One of `entry`, `re-detection`, `exit`
	pub event_type: String,

	pub timestamp: DateTimeUtc,

	/// Path of the triggering image, opaque to the core
	pub image_path: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
