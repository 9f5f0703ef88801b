//! End-to-end scenarios through the full tracking core

use ft_core::{
	AppConfig, BoundingBox, CoreError, Event, FaceTracker, FrameObservations, TrackedFace,
	VisitEventFilter, VisitEventKind,
};
use pretty_assertions::assert_eq;
use std::path::Path;
use tempfile::TempDir;

fn test_config(dir: &Path, exit_threshold_frames: u64) -> AppConfig {
	let mut config = AppConfig::default_with_dir(dir.to_path_buf());
	config.matching.embedding_dim = 2;
	config.matching.similarity_threshold = 0.5;
	config.lifecycle.exit_threshold_frames = exit_threshold_frames;
	config
}

fn face(track_id: u64, embedding: &[f32]) -> TrackedFace {
	TrackedFace {
		track_id,
		bbox: BoundingBox::new(0.0, 0.0, 64.0, 64.0),
		confidence: 0.9,
		embedding: embedding.to_vec(),
		snapshot: None,
	}
}

fn frame(frame_number: u64, faces: Vec<TrackedFace>) -> FrameObservations {
	FrameObservations {
		frame_number,
		snapshot: None,
		faces,
	}
}

const E1: [f32; 2] = [1.0, 0.0];
const E2: [f32; 2] = [0.0, 1.0];

#[tokio::test]
async fn single_visitor_full_session() {
	let temp = TempDir::new().unwrap();
	let mut tracker = FaceTracker::open(test_config(temp.path(), 50)).await.unwrap();

	// First contact registers and enters
	let events = tracker.process_frame(&frame(1, vec![face(1, &E1)])).await.unwrap();
	assert_eq!(events.len(), 1);
	assert_eq!(events[0].kind, VisitEventKind::Entry);
	assert_eq!(events[0].visitor_id.as_str(), "visitor_0001");

	// Same embedding while present re-detects
	let events = tracker.process_frame(&frame(5, vec![face(1, &E1)])).await.unwrap();
	assert_eq!(events.len(), 1);
	assert_eq!(events[0].kind, VisitEventKind::Redetection);
	assert_eq!(events[0].visitor_id.as_str(), "visitor_0001");

	// Unseen frames: the gap first exceeds 50 at frame 56, not earlier
	for n in 6..=55 {
		let events = tracker.process_frame(&FrameObservations::empty(n)).await.unwrap();
		assert!(events.is_empty(), "unexpected events at frame {n}");
	}
	let events = tracker.process_frame(&FrameObservations::empty(56)).await.unwrap();
	assert_eq!(events.len(), 1);
	assert_eq!(events[0].kind, VisitEventKind::Exit);
	assert_eq!(events[0].visitor_id.as_str(), "visitor_0001");

	// Exactly one session in the durable log
	let logged = tracker.visit_log().query(&VisitEventFilter::default()).await.unwrap();
	let kinds: Vec<_> = logged.iter().map(|e| e.kind).collect();
	assert_eq!(
		kinds,
		vec![
			VisitEventKind::Entry,
			VisitEventKind::Redetection,
			VisitEventKind::Exit
		]
	);
	assert_eq!(tracker.visitor_count(), 1);
	assert_eq!(tracker.present_count(), 0);
}

#[tokio::test]
async fn two_visitors_in_one_frame_enter_in_track_order() {
	let temp = TempDir::new().unwrap();
	let mut tracker = FaceTracker::open(test_config(temp.path(), 50)).await.unwrap();

	// Faces supplied out of track order; processing sorts by track id
	let events = tracker
		.process_frame(&frame(1, vec![face(2, &E2), face(1, &E1)]))
		.await
		.unwrap();

	assert_eq!(events.len(), 2);
	assert_eq!(events[0].kind, VisitEventKind::Entry);
	assert_eq!(events[0].visitor_id.as_str(), "visitor_0001");
	assert_eq!(events[1].kind, VisitEventKind::Entry);
	assert_eq!(events[1].visitor_id.as_str(), "visitor_0002");
	assert_eq!(tracker.visitor_count(), 2);
}

#[tokio::test]
async fn malformed_observation_is_skipped_not_fatal() {
	let temp = TempDir::new().unwrap();
	let mut tracker = FaceTracker::open(test_config(temp.path(), 50)).await.unwrap();

	let events = tracker
		.process_frame(&frame(
			1,
			vec![
				face(1, &E1),
				face(2, &[0.3, 0.3, 0.3]), // wrong embedding length
				face(3, &E2),
			],
		))
		.await
		.unwrap();

	assert_eq!(events.len(), 2);
	assert_eq!(tracker.visitor_count(), 2);
}

#[tokio::test]
async fn low_confidence_detections_are_ignored() {
	let temp = TempDir::new().unwrap();
	let mut tracker = FaceTracker::open(test_config(temp.path(), 50)).await.unwrap();

	let mut weak = face(1, &E1);
	weak.confidence = 0.2;

	let events = tracker.process_frame(&frame(1, vec![weak])).await.unwrap();
	assert!(events.is_empty());
	assert_eq!(tracker.visitor_count(), 0);
}

#[tokio::test]
async fn out_of_order_frames_are_rejected() {
	let temp = TempDir::new().unwrap();
	let mut tracker = FaceTracker::open(test_config(temp.path(), 50)).await.unwrap();

	tracker.process_frame(&FrameObservations::empty(5)).await.unwrap();

	let result = tracker.process_frame(&FrameObservations::empty(5)).await;
	assert!(matches!(result, Err(CoreError::InvalidOperation(_))));

	let result = tracker.process_frame(&FrameObservations::empty(4)).await;
	assert!(matches!(result, Err(CoreError::InvalidOperation(_))));
}

#[tokio::test]
async fn reappearance_after_exit_is_a_new_entry() {
	let temp = TempDir::new().unwrap();
	let mut tracker = FaceTracker::open(test_config(temp.path(), 3)).await.unwrap();

	tracker.process_frame(&frame(1, vec![face(1, &E1)])).await.unwrap();

	// Gap of 4 > 3 closes the session at frame 5
	for n in 2..=4 {
		assert!(tracker
			.process_frame(&FrameObservations::empty(n))
			.await
			.unwrap()
			.is_empty());
	}
	let events = tracker.process_frame(&FrameObservations::empty(5)).await.unwrap();
	assert_eq!(events[0].kind, VisitEventKind::Exit);

	// Known embedding, but the session is fresh: entry again, no new id
	let events = tracker.process_frame(&frame(10, vec![face(7, &E1)])).await.unwrap();
	assert_eq!(events.len(), 1);
	assert_eq!(events[0].kind, VisitEventKind::Entry);
	assert_eq!(events[0].visitor_id.as_str(), "visitor_0001");
	assert_eq!(tracker.visitor_count(), 1);
}

#[tokio::test]
async fn restart_preserves_identities_but_not_sessions() {
	let temp = TempDir::new().unwrap();
	let mut config = test_config(temp.path(), 50);
	config.lifecycle.final_sweep_on_shutdown = false;

	{
		let mut tracker = FaceTracker::open(config.clone()).await.unwrap();
		let events = tracker.process_frame(&frame(1, vec![face(1, &E1)])).await.unwrap();
		assert_eq!(events[0].kind, VisitEventKind::Entry);
		tracker.shutdown(None).await.unwrap();
	}

	let mut tracker = FaceTracker::open(config).await.unwrap();
	assert_eq!(tracker.visitor_count(), 1);

	// Identity survives; the presence table does not, so this is a fresh
	// session for a known visitor
	let events = tracker.process_frame(&frame(1, vec![face(1, &E1)])).await.unwrap();
	assert_eq!(events.len(), 1);
	assert_eq!(events[0].kind, VisitEventKind::Entry);
	assert_eq!(events[0].visitor_id.as_str(), "visitor_0001");
	assert_eq!(tracker.visitor_count(), 1);
}

#[tokio::test]
async fn shutdown_sweep_closes_open_sessions() {
	let temp = TempDir::new().unwrap();
	let mut tracker = FaceTracker::open(test_config(temp.path(), 50)).await.unwrap();

	tracker.process_frame(&frame(1, vec![face(1, &E1)])).await.unwrap();
	assert_eq!(tracker.present_count(), 1);

	let exits = tracker.shutdown(None).await.unwrap();
	assert_eq!(exits.len(), 1);
	assert_eq!(exits[0].kind, VisitEventKind::Exit);
	assert_eq!(tracker.present_count(), 0);
}

#[tokio::test]
async fn shutdown_without_final_sweep_leaves_sessions_open() {
	let temp = TempDir::new().unwrap();
	let mut config = test_config(temp.path(), 50);
	config.lifecycle.final_sweep_on_shutdown = false;
	let mut tracker = FaceTracker::open(config).await.unwrap();

	tracker.process_frame(&frame(1, vec![face(1, &E1)])).await.unwrap();
	let exits = tracker.shutdown(None).await.unwrap();
	assert!(exits.is_empty());

	let logged = tracker
		.visit_log()
		.query(&VisitEventFilter {
			kinds: Some(vec![VisitEventKind::Exit]),
			..Default::default()
		})
		.await
		.unwrap();
	assert!(logged.is_empty());
}

#[tokio::test]
async fn identical_streams_produce_identical_event_sequences() {
	async fn run(dir: &Path) -> Vec<(String, VisitEventKind)> {
		let mut tracker = FaceTracker::open(test_config(dir, 2)).await.unwrap();
		let stream = vec![
			frame(1, vec![face(1, &E1)]),
			frame(2, vec![face(2, &E2), face(1, &E1)]),
			frame(3, vec![face(2, &E2)]),
			frame(6, vec![]),
			frame(7, vec![face(9, &E1)]),
		];

		let mut sequence = Vec::new();
		for f in &stream {
			for event in tracker.process_frame(f).await.unwrap() {
				sequence.push((event.visitor_id.as_str().to_string(), event.kind));
			}
		}
		sequence
	}

	let (temp_a, temp_b) = (TempDir::new().unwrap(), TempDir::new().unwrap());
	let a = run(temp_a.path()).await;
	let b = run(temp_b.path()).await;

	assert_eq!(a, b);
	assert!(!a.is_empty());
}

#[tokio::test]
async fn subscribers_see_events_live() {
	let temp = TempDir::new().unwrap();
	let mut tracker = FaceTracker::open(test_config(temp.path(), 50)).await.unwrap();
	let mut rx = tracker.subscribe();

	tracker.process_frame(&frame(1, vec![face(1, &E1)])).await.unwrap();

	match rx.recv().await.unwrap() {
		Event::Visit(event) => {
			assert_eq!(event.kind, VisitEventKind::Entry);
			assert_eq!(event.visitor_id.as_str(), "visitor_0001");
		}
		other => panic!("unexpected event: {other:?}"),
	}
}
