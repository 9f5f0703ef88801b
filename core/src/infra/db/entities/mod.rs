//! SeaORM entities
//!
//! `visitor` lives in the identity database, `visit` in the visit log
//! database; the two are never joined.

pub mod visit;
pub mod visitor;
