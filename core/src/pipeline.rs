//! Per-frame processing pipeline
//!
//! One frame is fully absorbed — observations resolved, lifecycle
//! updated, events persisted, exit sweep run — before the next one is
//! accepted. Exit timeouts are counted in processed frames, so the frame
//! order is load-bearing; out-of-order input is rejected rather than
//! reinterpreted.

use crate::common::errors::{CoreError, Result, ValidationError};
use crate::config::AppConfig;
use crate::domain::{FrameObservations, TrackedFace, VisitEvent, VisitEventKind};
use crate::identity::IdentityResolver;
use crate::infra::event::{Event, EventBus};
use crate::session::LifecycleTracker;
use crate::visit_log::VisitLog;
use chrono::Utc;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub struct FramePipeline {
	resolver: IdentityResolver,
	lifecycle: LifecycleTracker,
	visit_log: VisitLog,
	events: EventBus,

	embedding_dim: usize,
	min_confidence: f32,

	last_frame: Option<u64>,
}

impl FramePipeline {
	pub(crate) fn new(
		config: &AppConfig,
		resolver: IdentityResolver,
		visit_log: VisitLog,
		events: EventBus,
	) -> Self {
		Self {
			resolver,
			lifecycle: LifecycleTracker::new(config.lifecycle.exit_threshold_frames),
			visit_log,
			events,
			embedding_dim: config.matching.embedding_dim,
			min_confidence: config.ingest.min_confidence,
			last_frame: None,
		}
	}

	/// Absorb one frame of observations and return the events it produced
	/// (entries and re-detections in ascending track-id order, then any
	/// swept exits in ascending visitor-id order).
	pub async fn process_frame(&mut self, frame: &FrameObservations) -> Result<Vec<VisitEvent>> {
		if let Some(last) = self.last_frame {
			if frame.frame_number <= last {
				return Err(CoreError::InvalidOperation(format!(
					"frame {} arrived after frame {last}; frames must be strictly increasing",
					frame.frame_number
				)));
			}
		}
		self.last_frame = Some(frame.frame_number);

		let mut faces: Vec<&TrackedFace> = frame.faces.iter().collect();
		faces.sort_by_key(|face| face.track_id);

		let mut emitted = Vec::new();

		for face in faces {
			if face.confidence < self.min_confidence {
				debug!(
					track_id = face.track_id,
					confidence = face.confidence,
					"Detection below confidence floor, skipping"
				);
				continue;
			}

			if let Err(error) = self.validate(face) {
				warn!(
					track_id = face.track_id,
					frame = frame.frame_number,
					%error,
					"Rejected observation"
				);
				continue;
			}

			let resolution = self.resolver.resolve(&face.embedding).await?;
			let kind = self
				.lifecycle
				.observe(&resolution.identity.id, frame.frame_number);

			match kind {
				VisitEventKind::Entry if resolution.is_new => {
					info!(visitor = %resolution.identity.id, "New visitor registered")
				}
				VisitEventKind::Entry => {
					info!(visitor = %resolution.identity.id, "Known visitor returned")
				}
				_ => debug!(visitor = %resolution.identity.id, "Visitor seen again"),
			}

			let event = VisitEvent {
				visitor_id: resolution.identity.id,
				kind,
				timestamp: Utc::now(),
				evidence: face.snapshot.clone(),
			};
			self.emit(&mut emitted, event).await?;
		}

		for visitor_id in self.lifecycle.sweep(frame.frame_number) {
			let event = VisitEvent {
				visitor_id,
				kind: VisitEventKind::Exit,
				timestamp: Utc::now(),
				evidence: frame.snapshot.clone(),
			};
			self.emit(&mut emitted, event).await?;
		}

		Ok(emitted)
	}

	/// Close every open session with an exit event, regardless of gap.
	/// Called by the shutdown path when the final sweep is enabled.
	pub async fn finish(&mut self, evidence: Option<PathBuf>) -> Result<Vec<VisitEvent>> {
		let mut emitted = Vec::new();
		for visitor_id in self.lifecycle.drain() {
			info!(visitor = %visitor_id, "Closing session at shutdown");
			let event = VisitEvent {
				visitor_id,
				kind: VisitEventKind::Exit,
				timestamp: Utc::now(),
				evidence: evidence.clone(),
			};
			self.emit(&mut emitted, event).await?;
		}
		Ok(emitted)
	}

	async fn emit(&mut self, emitted: &mut Vec<VisitEvent>, event: VisitEvent) -> Result<()> {
		self.visit_log.append(&event).await?;
		self.events.emit(Event::Visit(event.clone()));
		emitted.push(event);
		Ok(())
	}

	fn validate(&self, face: &TrackedFace) -> std::result::Result<(), ValidationError> {
		if !face.bbox.is_well_formed() {
			return Err(ValidationError::MalformedBoundingBox {
				x1: face.bbox.x1,
				y1: face.bbox.y1,
				x2: face.bbox.x2,
				y2: face.bbox.y2,
			});
		}

		if face.embedding.len() != self.embedding_dim {
			return Err(ValidationError::EmbeddingLength {
				expected: self.embedding_dim,
				actual: face.embedding.len(),
			});
		}

		if face.embedding.iter().any(|v| !v.is_finite()) {
			return Err(ValidationError::NonFiniteEmbedding);
		}

		Ok(())
	}

	pub fn visit_log(&self) -> &VisitLog {
		&self.visit_log
	}

	pub fn visitor_count(&self) -> usize {
		self.resolver.store().count()
	}

	pub fn present_count(&self) -> usize {
		self.lifecycle.present_count()
	}
}
