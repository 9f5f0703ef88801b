//! Identity resolution: embedding store + resolver
//!
//! The store owns the durable identity table and the distance-matching
//! policy; the resolver is the thin composition the lifecycle layer talks
//! to, so nothing downstream ever sees an embedding distance.

pub mod resolver;
pub mod store;

pub use resolver::{IdentityResolver, Resolution};
pub use store::EmbeddingStore;
