//! Event bus for decoupled communication
//!
//! Live consumers (a dashboard, tests) subscribe for events as they are
//! emitted; the bus is lossy for slow receivers and never affects the
//! durable log.

use crate::domain::VisitEvent;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

/// A central event type that represents all events that can be emitted
/// throughout the system
#[derive(Debug, Clone, Serialize, strum::AsRefStr)]
pub enum Event {
	CoreStarted,
	CoreShutdown,
	Visit(VisitEvent),
}

/// Broadcast fan-out for [`Event`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
	tx: broadcast::Sender<Event>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (tx, _rx) = broadcast::channel(capacity);
		Self { tx }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<Event> {
		self.tx.subscribe()
	}

	/// Emit to all current subscribers. Having no subscribers is normal.
	pub fn emit(&self, event: Event) {
		trace!(kind = event.as_ref(), "Emitting event");
		let _ = self.tx.send(event);
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(1024)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::domain::{VisitEventKind, VisitorId};

	#[tokio::test]
	async fn delivers_to_subscribers() {
		let bus = EventBus::new(16);
		let mut rx = bus.subscribe();

		bus.emit(Event::Visit(VisitEvent {
			visitor_id: VisitorId::from_sequence(1),
			kind: VisitEventKind::Entry,
			timestamp: chrono::Utc::now(),
			evidence: None,
		}));

		match rx.recv().await.unwrap() {
			Event::Visit(event) => assert_eq!(event.kind, VisitEventKind::Entry),
			other => panic!("unexpected event: {other:?}"),
		}
	}

	#[tokio::test]
	async fn emitting_without_subscribers_is_fine() {
		let bus = EventBus::new(16);
		bus.emit(Event::CoreStarted);
	}
}
