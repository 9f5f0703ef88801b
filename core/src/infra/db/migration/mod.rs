//! Identity database migrations

use sea_orm_migration::prelude::*;

mod m20260301_000001_create_visitors;

pub struct IdentityMigrator;

#[async_trait::async_trait]
impl MigratorTrait for IdentityMigrator {
	fn migrations() -> Vec<Box<dyn MigrationTrait>> {
		vec![Box::new(m20260301_000001_create_visitors::Migration)]
	}
}
