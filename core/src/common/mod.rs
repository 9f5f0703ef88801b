//! Shared error and result types

pub mod errors;

pub use errors::{CoreError, Result, ValidationError};
