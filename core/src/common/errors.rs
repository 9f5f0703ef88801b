//! Unified error handling for the core

use thiserror::Error;

/// Main error type for core operations
#[derive(Error, Debug)]
pub enum CoreError {
	#[error("Database error: {0}")]
	Database(#[from] sea_orm::DbErr),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Invalid observation: {0}")]
	Validation(#[from] ValidationError),

	#[error("Corrupt identity table: {0}")]
	CorruptIdentityTable(String),

	#[error("Corrupt visit log: {0}")]
	CorruptVisitLog(String),

	#[error("Invalid operation: {0}")]
	InvalidOperation(String),

	#[error("Other error: {0}")]
	Other(#[from] anyhow::Error),
}

/// Per-observation rejections. Recovered locally by the pipeline (the
/// observation is skipped, the rest of the frame continues), never fatal
/// to the stream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
	#[error("embedding has {actual} dimensions, expected {expected}")]
	EmbeddingLength { expected: usize, actual: usize },

	#[error("embedding contains a non-finite value")]
	NonFiniteEmbedding,

	#[error("malformed bounding box ({x1}, {y1}, {x2}, {y2})")]
	MalformedBoundingBox { x1: f32, y1: f32, x2: f32, y2: f32 },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
