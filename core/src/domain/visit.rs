//! Visit events derived from the session lifecycle

use super::VisitorId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of visit event. The string forms match what the log sink stores
/// in its `event_type` column.
#[derive(
	Debug,
	Clone,
	Copy,
	PartialEq,
	Eq,
	PartialOrd,
	Ord,
	Hash,
	Serialize,
	Deserialize,
	strum::Display,
	strum::EnumString,
)]
pub enum VisitEventKind {
	/// First observation of a fresh session
	#[serde(rename = "entry")]
	#[strum(serialize = "entry")]
	Entry,

	/// Observation of a visitor whose session is already open
	#[serde(rename = "re-detection")]
	#[strum(serialize = "re-detection")]
	Redetection,

	/// Session closed after the absence gap exceeded the threshold
	#[serde(rename = "exit")]
	#[strum(serialize = "exit")]
	Exit,
}

/// One append-only record of the visit log.
///
/// `evidence` points at the image that triggered the event (a face crop
/// for entry/re-detection, a frame snapshot for exit); the core treats it
/// as an opaque handle supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitEvent {
	pub visitor_id: VisitorId,
	pub kind: VisitEventKind,
	pub timestamp: DateTime<Utc>,
	pub evidence: Option<PathBuf>,
}
