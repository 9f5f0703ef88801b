//! Visitor identity entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "visitors")]
pub struct Model {
	#[sea_orm(primary_key)]
	#[serde(default)]
	pub id: i32,

	/// Stable visitor id, e.g. `visitor_0001`
	pub face_id: String,

	/// Reference embedding as a JSON array of floats, immutable after
	/// registration
	pub embedding: Json,

	pub first_seen: DateTimeUtc,
	pub last_seen: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
