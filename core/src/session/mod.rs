//! Visit session lifecycle tracking
//!
//! Per-visitor state machine with two states, Absent and Present. A
//! visitor is Present exactly while it has an entry in the presence
//! table; the table is ephemeral and rebuilt from scratch on process
//! start, so the first observation after a restart opens a fresh session.
//!
//! Exit detection is evidence-driven: there is no "person left" signal,
//! only the absence of observations. The sweep runs once per processed
//! frame and closes every session whose gap strictly exceeds the
//! configured frame threshold.

use crate::domain::{VisitEventKind, VisitorId};
use std::collections::BTreeMap;
use tracing::info;

pub struct LifecycleTracker {
	exit_threshold_frames: u64,

	/// Present visitors → frame they were last observed in. BTreeMap so
	/// sweeps emit exits in ascending visitor-id order.
	present: BTreeMap<VisitorId, u64>,
}

impl LifecycleTracker {
	pub fn new(exit_threshold_frames: u64) -> Self {
		Self {
			exit_threshold_frames,
			present: BTreeMap::new(),
		}
	}

	/// Record one resolved observation.
	///
	/// Absent → Present yields `Entry`; an observation while already
	/// Present yields `Redetection`. Whether the resolver registered the
	/// visitor just now is irrelevant here: a visitor returning after a
	/// logged exit resolves as known but still starts a fresh session.
	pub fn observe(&mut self, visitor_id: &VisitorId, frame_number: u64) -> VisitEventKind {
		match self.present.insert(visitor_id.clone(), frame_number) {
			None => VisitEventKind::Entry,
			Some(_) => VisitEventKind::Redetection,
		}
	}

	/// Close every session whose absence gap strictly exceeds the
	/// threshold. Returns the exited visitors in ascending id order.
	pub fn sweep(&mut self, current_frame: u64) -> Vec<VisitorId> {
		let threshold = self.exit_threshold_frames;
		let exited: Vec<VisitorId> = self
			.present
			.iter()
			.filter(|(_, last_seen)| current_frame.saturating_sub(**last_seen) > threshold)
			.map(|(id, _)| id.clone())
			.collect();

		for id in &exited {
			self.present.remove(id);
			info!(visitor = %id, frame = current_frame, "Visitor left the frame");
		}

		exited
	}

	/// Close all remaining sessions regardless of gap. Invoked only by an
	/// explicit shutdown sweep; a stream that merely ends leaves sessions
	/// open.
	pub fn drain(&mut self) -> Vec<VisitorId> {
		std::mem::take(&mut self.present).into_keys().collect()
	}

	/// Number of currently open sessions
	pub fn present_count(&self) -> usize {
		self.present.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	fn vid(seq: usize) -> VisitorId {
		VisitorId::from_sequence(seq)
	}

	#[test]
	fn first_observation_is_an_entry() {
		let mut tracker = LifecycleTracker::new(50);
		assert_eq!(tracker.observe(&vid(1), 1), VisitEventKind::Entry);
		assert_eq!(tracker.observe(&vid(1), 2), VisitEventKind::Redetection);
		assert_eq!(tracker.present_count(), 1);
	}

	#[test]
	fn exit_requires_gap_strictly_over_threshold() {
		let mut tracker = LifecycleTracker::new(3);
		tracker.observe(&vid(1), 1);

		// Gap of exactly 3 frames: still present
		assert!(tracker.sweep(4).is_empty());

		// Gap of 4: exit
		assert_eq!(tracker.sweep(5), vec![vid(1)]);
		assert_eq!(tracker.present_count(), 0);

		// Already exited, no second exit
		assert!(tracker.sweep(6).is_empty());
	}

	#[test]
	fn observation_refreshes_the_gap() {
		let mut tracker = LifecycleTracker::new(3);
		tracker.observe(&vid(1), 1);
		tracker.observe(&vid(1), 4);

		assert!(tracker.sweep(7).is_empty());
		assert_eq!(tracker.sweep(8), vec![vid(1)]);
	}

	#[test]
	fn reappearance_after_exit_opens_a_fresh_session() {
		let mut tracker = LifecycleTracker::new(3);
		tracker.observe(&vid(1), 1);
		tracker.sweep(5);

		assert_eq!(tracker.observe(&vid(1), 10), VisitEventKind::Entry);
	}

	#[test]
	fn simultaneous_exits_come_out_in_id_order() {
		let mut tracker = LifecycleTracker::new(2);
		// Observed in reverse id order
		tracker.observe(&vid(3), 1);
		tracker.observe(&vid(1), 1);
		tracker.observe(&vid(2), 1);

		assert_eq!(tracker.sweep(4), vec![vid(1), vid(2), vid(3)]);
	}

	#[test]
	fn drain_closes_everything() {
		let mut tracker = LifecycleTracker::new(50);
		tracker.observe(&vid(2), 1);
		tracker.observe(&vid(1), 1);

		assert_eq!(tracker.drain(), vec![vid(1), vid(2)]);
		assert_eq!(tracker.present_count(), 0);
		assert!(tracker.drain().is_empty());
	}
}
