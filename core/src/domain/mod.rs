//! Domain types for visitor tracking

pub mod observation;
pub mod visit;
pub mod visitor;

pub use observation::{BoundingBox, FrameObservations, TrackedFace};
pub use visit::{VisitEvent, VisitEventKind};
pub use visitor::{VisitorId, VisitorIdentity};
