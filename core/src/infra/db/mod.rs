//! SQLite connection setup shared by both databases

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr};
use std::path::Path;
use tracing::debug;

pub mod entities;
pub mod migration;

/// Open (creating if missing) a SQLite database at `path` and apply the
/// connection pragmas.
pub async fn connect(path: &Path) -> Result<DatabaseConnection, DbErr> {
	let url = format!("sqlite://{}?mode=rwc", path.display());
	let conn = Database::connect(&url).await?;
	configure_pragmas(&conn).await?;
	debug!(path = %path.display(), "Opened SQLite database");
	Ok(conn)
}

/// WAL keeps the log readable by external consumers (the dashboard) while
/// the core appends. `synchronous = FULL` makes every committed mutation
/// reach disk before the call returns, which the identity store and visit
/// log both rely on.
async fn configure_pragmas(conn: &DatabaseConnection) -> Result<(), DbErr> {
	conn.execute_unprepared("PRAGMA journal_mode = WAL;").await?;
	conn.execute_unprepared("PRAGMA synchronous = FULL;").await?;
	conn.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
	Ok(())
}
