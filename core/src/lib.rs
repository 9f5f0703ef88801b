//! ft-core — visitor identity resolution and visit lifecycle tracking
//!
//! Consumes per-frame tracked face observations produced by an external
//! detector/tracker/recognizer stack and derives a durable record of
//! visitor identities and visit events (entry, re-detection, exit). The
//! identity table and the visit log are persisted in two independent
//! SQLite databases so consumers can read one while the core writes the
//! other.

use std::path::Path;
use tracing::info;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
	filter::LevelFilter,
	fmt::{self, Layer},
	prelude::*,
	EnvFilter,
};

pub mod common;
pub mod config;
pub mod domain;
pub mod identity;
pub mod infra;
pub mod pipeline;
pub mod session;
pub mod visit_log;

pub use common::errors::{CoreError, Result, ValidationError};
pub use config::AppConfig;
pub use domain::{
	BoundingBox, FrameObservations, TrackedFace, VisitEvent, VisitEventKind, VisitorId,
	VisitorIdentity,
};
pub use infra::event::{Event, EventBus};
pub use visit_log::{DailyCount, VisitEventFilter, VisitLog};

use identity::{EmbeddingStore, IdentityResolver};
use infra::db::migration::IdentityMigrator;
use pipeline::FramePipeline;
use sea_orm_migration::MigratorTrait;
use visit_log::VisitLogMigrator;

/// Set up console + daily-rolling file logging under the data directory.
/// The returned guard must be held for the lifetime of the process or
/// buffered file output is lost.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
	let (non_blocking, guard) =
		tracing_appender::non_blocking(rolling::daily(config.logs_dir(), "facetrack.log"));

	let console_filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(&config.log_level))
		.unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::registry()
		.with(fmt::layer().with_filter(console_filter))
		.with(
			Layer::default()
				.with_writer(non_blocking)
				.with_ansi(false)
				.with_filter(LevelFilter::DEBUG),
		)
		.init();

	guard
}

/// Composition root: owns both databases, the identity resolver, the
/// session tracker, and the visit log, and drives them strictly
/// frame-by-frame. All mutation funnels through `&mut self`, preserving
/// the single-writer discipline the match+register pair needs.
pub struct FaceTracker {
	config: AppConfig,
	pipeline: FramePipeline,
	events: EventBus,
}

impl FaceTracker {
	/// Open (creating or migrating as needed) both databases and load
	/// the identity table. A store that cannot be fully loaded is fatal
	/// here — the system never starts with an ambiguous identity space.
	pub async fn open(config: AppConfig) -> Result<Self> {
		config.ensure_directories()?;

		let identity_db = infra::db::connect(&config.identity_db_path()).await?;
		IdentityMigrator::up(&identity_db, None).await?;

		let visit_db = infra::db::connect(&config.visit_db_path()).await?;
		VisitLogMigrator::up(&visit_db, None).await?;

		let store = EmbeddingStore::load(
			identity_db,
			config.matching.similarity_threshold,
			config.matching.embedding_dim,
		)
		.await?;

		let events = EventBus::default();
		let pipeline = FramePipeline::new(
			&config,
			IdentityResolver::new(store),
			VisitLog::new(visit_db),
			events.clone(),
		);

		info!(
			visitors = pipeline.visitor_count(),
			data_dir = %config.data_dir.display(),
			"Face tracker core started"
		);
		events.emit(Event::CoreStarted);

		Ok(Self {
			config,
			pipeline,
			events,
		})
	}

	/// Process one frame. Frame numbers must be strictly increasing; the
	/// frame's full effect (resolution, lifecycle updates, exit sweep) is
	/// durable before this returns.
	pub async fn process_frame(&mut self, frame: &FrameObservations) -> Result<Vec<VisitEvent>> {
		self.pipeline.process_frame(frame).await
	}

	/// Graceful shutdown. When `lifecycle.final_sweep_on_shutdown` is
	/// set, all still-open sessions are closed with exit events; with it
	/// disabled, sessions are simply dropped (the stream ended without
	/// the visitors timing out).
	pub async fn shutdown(&mut self, evidence: Option<&Path>) -> Result<Vec<VisitEvent>> {
		info!("Face tracker shutting down...");

		let exits = if self.config.lifecycle.final_sweep_on_shutdown {
			self.pipeline.finish(evidence.map(Path::to_path_buf)).await?
		} else {
			Vec::new()
		};

		self.events.emit(Event::CoreShutdown);
		info!(closed_sessions = exits.len(), "Shutdown complete");
		Ok(exits)
	}

	/// Subscribe to live events (visit events plus core lifecycle)
	pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
		self.events.subscribe()
	}

	/// Durable, queryable visit event log
	pub fn visit_log(&self) -> &VisitLog {
		self.pipeline.visit_log()
	}

	/// Number of registered visitor identities
	pub fn visitor_count(&self) -> usize {
		self.pipeline.visitor_count()
	}

	/// Number of currently open sessions
	pub fn present_count(&self) -> usize {
		self.pipeline.present_count()
	}

	pub fn config(&self) -> &AppConfig {
		&self.config
	}
}
