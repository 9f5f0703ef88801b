//! Visit log database migrations
//!
//! The visit log lives in a separate database from the identity table, so
//! it has its own migration system; a dashboard can read one while the
//! core writes the other.

use sea_orm_migration::prelude::*;

/// Migrator for the visit log database
pub struct VisitLogMigrator;

#[async_trait::async_trait]
impl MigratorTrait for VisitLogMigrator {
	fn migrations() -> Vec<Box<dyn MigrationTrait>> {
		vec![Box::new(InitialVisitLogSchema)]
	}
}

/// Initial visit log schema migration
#[derive(DeriveMigrationName)]
pub struct InitialVisitLogSchema;

#[async_trait::async_trait]
impl MigrationTrait for InitialVisitLogSchema {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.create_table(
				Table::create()
					.table(Visits::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(Visits::Id)
							.integer()
							.not_null()
							.auto_increment()
							.primary_key(),
					)
					.col(ColumnDef::new(Visits::FaceId).string().not_null())
					.col(ColumnDef::new(Visits::EventType).string().not_null())
					.col(
						ColumnDef::new(Visits::Timestamp)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.col(ColumnDef::new(Visits::ImagePath).string())
					.to_owned(),
			)
			.await?;

		// Per-visitor history lookups
		manager
			.create_index(
				Index::create()
					.name("idx_visits_face_id")
					.table(Visits::Table)
					.col(Visits::FaceId)
					.to_owned(),
			)
			.await?;

		// Timestamp-ordered queries and range filters
		manager
			.create_index(
				Index::create()
					.name("idx_visits_timestamp")
					.table(Visits::Table)
					.col(Visits::Timestamp)
					.to_owned(),
			)
			.await?;

		manager
			.create_index(
				Index::create()
					.name("idx_visits_event_type")
					.table(Visits::Table)
					.col(Visits::EventType)
					.to_owned(),
			)
			.await?;

		Ok(())
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.drop_table(Table::drop().table(Visits::Table).to_owned())
			.await
	}
}

/// Visit log table identifier
#[derive(DeriveIden)]
enum Visits {
	Table,
	Id,
	FaceId,
	EventType,
	Timestamp,
	ImagePath,
}
