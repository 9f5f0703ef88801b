//! Initial identity database schema

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.create_table(
				Table::create()
					.table(Visitors::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(Visitors::Id)
							.integer()
							.not_null()
							.auto_increment()
							.primary_key(),
					)
					.col(
						ColumnDef::new(Visitors::FaceId)
							.string()
							.not_null()
							.unique_key(),
					)
					.col(ColumnDef::new(Visitors::Embedding).json().not_null())
					.col(
						ColumnDef::new(Visitors::FirstSeen)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.col(
						ColumnDef::new(Visitors::LastSeen)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.to_owned(),
			)
			.await?;

		// Lookups during update_last_seen go through the stable id
		manager
			.create_index(
				Index::create()
					.name("idx_visitors_face_id")
					.table(Visitors::Table)
					.col(Visitors::FaceId)
					.to_owned(),
			)
			.await?;

		Ok(())
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.drop_table(Table::drop().table(Visitors::Table).to_owned())
			.await
	}
}

#[derive(DeriveIden)]
enum Visitors {
	Table,
	Id,
	FaceId,
	Embedding,
	FirstSeen,
	LastSeen,
}
