//! Durable append-only visit event log
//!
//! The only mutation is `append`; historical rows are never updated or
//! deleted. Ordering by `(timestamp, id)` is the authoritative event
//! order — the autoincrement id breaks ties between events logged within
//! the same timestamp tick.

use crate::common::errors::{CoreError, Result};
use crate::domain::{VisitEvent, VisitEventKind, VisitorId};
use crate::infra::db::entities::visit;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
	ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, ConnectionTrait,
	DatabaseConnection, DbBackend, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
	QuerySelect, Select, Statement,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

pub mod migration;

pub use migration::VisitLogMigrator;

/// Filters for querying the visit log. All fields are conjunctive; the
/// timestamp range is inclusive on both ends.
#[derive(Debug, Clone, Default)]
pub struct VisitEventFilter {
	pub visitor_id: Option<VisitorId>,
	pub kinds: Option<Vec<VisitEventKind>>,
	pub since: Option<DateTime<Utc>>,
	pub until: Option<DateTime<Utc>>,
}

/// Per-day, per-kind event count bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyCount {
	pub date: NaiveDate,
	pub kind: VisitEventKind,
	pub count: u64,
}

pub struct VisitLog {
	db: DatabaseConnection,
}

impl VisitLog {
	pub fn new(db: DatabaseConnection) -> Self {
		Self { db }
	}

	/// Durably store one event. The insert is committed before this
	/// returns; a crash afterwards cannot lose the event.
	pub async fn append(&self, event: &VisitEvent) -> Result<()> {
		visit::ActiveModel {
			id: NotSet,
			face_id: Set(event.visitor_id.as_str().to_string()),
			event_type: Set(event.kind.to_string()),
			timestamp: Set(event.timestamp),
			image_path: Set(event
				.evidence
				.as_ref()
				.map(|p| p.to_string_lossy().into_owned())),
		}
		.insert(&self.db)
		.await?;

		info!(
			visitor = %event.visitor_id,
			kind = %event.kind,
			"Visit event logged"
		);
		Ok(())
	}

	/// All events matching `filter`, ascending by timestamp
	pub async fn query(&self, filter: &VisitEventFilter) -> Result<Vec<VisitEvent>> {
		let rows = apply_filter(visit::Entity::find(), filter)
			.order_by_asc(visit::Column::Timestamp)
			.order_by_asc(visit::Column::Id)
			.all(&self.db)
			.await?;

		rows.into_iter().map(row_to_event).collect()
	}

	/// The `limit` most recent events, newest first
	pub async fn recent(&self, limit: u64) -> Result<Vec<VisitEvent>> {
		let rows = visit::Entity::find()
			.order_by_desc(visit::Column::Timestamp)
			.order_by_desc(visit::Column::Id)
			.limit(limit)
			.all(&self.db)
			.await?;

		rows.into_iter().map(row_to_event).collect()
	}

	/// Total number of logged events
	pub async fn total_events(&self) -> Result<u64> {
		Ok(visit::Entity::find().count(&self.db).await?)
	}

	/// Number of distinct visitors appearing in the log
	pub async fn unique_visitors(&self) -> Result<u64> {
		let row = self
			.db
			.query_one(Statement::from_string(
				DbBackend::Sqlite,
				"SELECT COUNT(DISTINCT face_id) AS n FROM visits".to_string(),
			))
			.await?
			.ok_or_else(|| CoreError::CorruptVisitLog("count query returned no row".into()))?;

		let n: i64 = row
			.try_get("", "n")
			.map_err(|e| CoreError::CorruptVisitLog(e.to_string()))?;
		Ok(n as u64)
	}

	/// Events matching `filter`, bucketed per day and event kind. Small
	/// result sets make folding in memory simpler than SQL grouping.
	pub async fn daily_counts(&self, filter: &VisitEventFilter) -> Result<Vec<DailyCount>> {
		let events = self.query(filter).await?;

		let mut buckets: BTreeMap<(NaiveDate, VisitEventKind), u64> = BTreeMap::new();
		for event in events {
			*buckets
				.entry((event.timestamp.date_naive(), event.kind))
				.or_insert(0) += 1;
		}

		Ok(buckets
			.into_iter()
			.map(|((date, kind), count)| DailyCount { date, kind, count })
			.collect())
	}
}

fn apply_filter(mut select: Select<visit::Entity>, filter: &VisitEventFilter) -> Select<visit::Entity> {
	if let Some(visitor_id) = &filter.visitor_id {
		select = select.filter(visit::Column::FaceId.eq(visitor_id.as_str()));
	}
	if let Some(kinds) = &filter.kinds {
		let kinds: Vec<String> = kinds.iter().map(|k| k.to_string()).collect();
		select = select.filter(visit::Column::EventType.is_in(kinds));
	}
	if let Some(since) = filter.since {
		select = select.filter(visit::Column::Timestamp.gte(since));
	}
	if let Some(until) = filter.until {
		select = select.filter(visit::Column::Timestamp.lte(until));
	}
	select
}

fn row_to_event(row: visit::Model) -> Result<VisitEvent> {
	let kind = row
		.event_type
		.parse::<VisitEventKind>()
		.map_err(|_| CoreError::CorruptVisitLog(format!("unknown event type {}", row.event_type)))?;

	Ok(VisitEvent {
		visitor_id: VisitorId::from(row.face_id),
		kind,
		timestamp: row.timestamp,
		evidence: row.image_path.map(PathBuf::from),
	})
}
