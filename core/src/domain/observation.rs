//! Per-frame input handed over by the external detector/tracker stack

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Axis-aligned box in pixel coordinates, `(x1, y1)` top-left and
/// `(x2, y2)` bottom-right exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
	pub x1: f32,
	pub y1: f32,
	pub x2: f32,
	pub y2: f32,
}

impl BoundingBox {
	pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
		Self { x1, y1, x2, y2 }
	}

	/// A box is usable when all coordinates are finite and it has
	/// positive extent on both axes.
	pub fn is_well_formed(&self) -> bool {
		[self.x1, self.y1, self.x2, self.y2]
			.iter()
			.all(|v| v.is_finite())
			&& self.x2 > self.x1
			&& self.y2 > self.y1
	}
}

/// One tracked detection selected for identification: the short-term
/// track id assigned by the external multi-object tracker, its box and
/// confidence, and the face embedding extracted from the crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedFace {
	pub track_id: u64,
	pub bbox: BoundingBox,
	pub confidence: f32,
	pub embedding: Vec<f32>,

	/// Path of the saved face crop, used as event evidence
	#[serde(default)]
	pub snapshot: Option<PathBuf>,
}

/// Everything observed in one processed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameObservations {
	/// Monotonically increasing frame sequence number; the unit in which
	/// exit timeouts are counted
	pub frame_number: u64,

	/// Path of the saved full-frame image, used as exit evidence
	#[serde(default)]
	pub snapshot: Option<PathBuf>,

	pub faces: Vec<TrackedFace>,
}

impl FrameObservations {
	pub fn empty(frame_number: u64) -> Self {
		Self {
			frame_number,
			snapshot: None,
			faces: Vec::new(),
		}
	}
}
